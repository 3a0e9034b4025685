use chrono::NaiveDate;

use super::ExportFormat;

const MAX_STEM_CHARS: usize = 100;
const FALLBACK_STEM: &str = "gemini_chat";

/// Lowercase the title and replace everything outside `[a-z0-9]` with `_`
pub fn sanitize_title(title: &str) -> String {
    let stem: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .take(MAX_STEM_CHARS)
        .collect();
    if stem.chars().all(|c| c == '_') { FALLBACK_STEM.to_string() } else { stem }
}

/// `<sanitized title>_<YYYY-MM-DD>.<ext>`
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use gemini_chat_exporter::export::{ExportFormat, export_filename};
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
/// assert_eq!(export_filename("My Chat!", ExportFormat::Markdown, date), "my_chat__2025-03-09.md");
/// ```
pub fn export_filename(title: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!("{}_{}.{}", sanitize_title(title), date.format("%Y-%m-%d"), format.extension())
}
