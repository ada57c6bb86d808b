/// Position in a remote result set
///
/// Threaded through page requests by value: the iterator derives the next
/// cursor from the current one instead of mutating request state in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor {
    /// Server-assigned identifier of the executed query, if one was issued
    pub result_set_id: Option<String>,
    /// 0-based index of the first record to request
    pub offset: u64,
    pub page_size: usize,
}

impl Cursor {
    /// Cursor for the first page of a fresh search
    pub fn start(page_size: usize) -> Self {
        Self {
            result_set_id: None,
            offset: 0,
            page_size: page_size.max(1),
        }
    }

    /// Same result set, another offset
    pub fn at(&self, offset: u64) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    /// Remember the result set the server reported
    pub fn with_result_set(&self, result_set_id: Option<String>) -> Self {
        Self {
            result_set_id,
            ..self.clone()
        }
    }

    /// 1-based `startRecord` request parameter
    pub fn start_record(&self) -> u64 {
        self.offset + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_transitions() {
        let cursor = Cursor::start(25);
        assert_eq!(cursor.start_record(), 1);

        let next = cursor
            .with_result_set(Some("rs-1".to_string()))
            .at(25);
        assert_eq!(next.start_record(), 26);
        assert_eq!(next.result_set_id.as_deref(), Some("rs-1"));
        // the original is untouched
        assert_eq!(cursor.offset, 0);
        assert_eq!(cursor.result_set_id, None);
    }

    #[test]
    fn test_page_size_is_positive() {
        assert_eq!(Cursor::start(0).page_size, 1);
    }
}
