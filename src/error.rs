use thiserror::Error;

/// Main error type for cqlindex operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Query parse error: {0}")]
    QueryParse(String),

    #[error("Invalid source document: {0}")]
    Document(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed search response: {0}")]
    ResponseParse(String),

    #[error("Result set no longer exists ({diagnostic})")]
    ResultSetExpired { diagnostic: String },

    #[error(
        "Fetching results failed after {attempts} attempts: {last_error}{}",
        diagnostic_suffix(.last_diagnostic)
    )]
    FetchFailed {
        attempts: u32,
        last_error: String,
        last_diagnostic: Option<String>,
    },

    #[error("No more records in the result set")]
    Exhausted,
}

fn diagnostic_suffix(diagnostic: &Option<String>) -> String {
    match diagnostic {
        Some(uri) => format!(" (last diagnostic: {})", uri),
        None => String::new(),
    }
}

/// Result type alias for cqlindex operations
pub type Result<T> = std::result::Result<T, SearchError>;

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Transport(err.to_string())
    }
}

impl SearchError {
    /// Check if this error indicates a page fetch that may be retried
    /// with the original query.
    ///
    /// A stale result set is never retriable: the identifier cannot become
    /// valid again, so the caller has to rerun the search.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SearchError::Transport(_) | SearchError::ResponseParse(_) | SearchError::Io(_)
        )
    }
}
