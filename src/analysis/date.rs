use chrono::NaiveDate;

/// Normalize a date value to `yyyyMMdd`
///
/// Only the first line is considered. Accepts `yyyy-MM-dd`, `yyyy-MM` and
/// `yyyy`; partial dates take the first day of the period.
pub fn normalize_date(value: &str) -> Option<String> {
    let line = value.lines().next()?.trim();

    let date = match line.len() {
        10 => NaiveDate::parse_from_str(line, "%Y-%m-%d").ok()?,
        7 => NaiveDate::parse_from_str(&format!("{}-01", line), "%Y-%m-%d").ok()?,
        4 if line.chars().all(|c| c.is_ascii_digit()) => {
            NaiveDate::parse_from_str(&format!("{}-01-01", line), "%Y-%m-%d").ok()?
        }
        _ => return None,
    };

    Some(date.format("%Y%m%d").to_string())
}
