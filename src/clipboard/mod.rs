//! Copying a formatted export to the system clipboard.

use anyhow::{Context, Result, bail};
use arboard::Clipboard;
use tracing::debug;

use crate::export::{ExportFormat, format_export};
use crate::models::ExtractionResult;

/// Largest export accepted for the clipboard (10MB)
const MAX_CLIPBOARD_BYTES: usize = 10 * 1024 * 1024;

/// Clipboard backend, swapped for a mock in tests
trait ClipboardProvider {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

struct SystemClipboard {
    clipboard: Clipboard,
}

impl SystemClipboard {
    fn new() -> Result<Self> {
        let clipboard = Clipboard::new().context("Failed to initialize clipboard")?;
        Ok(Self { clipboard })
    }
}

impl ClipboardProvider for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.set_text(text).context("Failed to set clipboard contents")
    }
}

fn validate_export_text(text: &str) -> Result<()> {
    if text.is_empty() {
        bail!("Cannot copy an empty export to the clipboard");
    }
    if text.len() > MAX_CLIPBOARD_BYTES {
        bail!(
            "Export too large for clipboard ({} bytes, max {} bytes)",
            text.len(),
            MAX_CLIPBOARD_BYTES
        );
    }
    Ok(())
}

fn copy_with_provider(
    result: &ExtractionResult,
    format: ExportFormat,
    provider: &mut dyn ClipboardProvider,
) -> Result<usize> {
    let text = format_export(result, format).context("Failed to format export")?;
    validate_export_text(&text)?;
    provider.set_text(&text)?;
    debug!(bytes = text.len(), ?format, "Copied export to clipboard");
    Ok(text.len())
}

/// Format `result` and place it on the system clipboard.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns an error if the export is larger than 10MB, or the clipboard is
/// unavailable (headless session, missing X11/Wayland, denied access).
pub fn copy_export(result: &ExtractionResult, format: ExportFormat) -> Result<usize> {
    let mut clipboard = SystemClipboard::new()?;
    copy_with_provider(result, format, &mut clipboard)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{Message, Role};

    #[derive(Default)]
    struct MockClipboard {
        text: Option<String>,
        fail: bool,
    }

    impl ClipboardProvider for MockClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            if self.fail {
                bail!("Mock clipboard error");
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    fn result_with(content: &str) -> ExtractionResult {
        let ts = Utc::now();
        ExtractionResult::new("Clip", vec![Message::new(Role::Assistant, content, ts)], ts)
    }

    #[test]
    fn test_copies_formatted_markdown() {
        let mut mock = MockClipboard::default();
        let copied =
            copy_with_provider(&result_with("Answer text"), ExportFormat::Markdown, &mut mock)
                .unwrap();

        let text = mock.text.unwrap();
        assert_eq!(copied, text.len());
        assert!(text.starts_with("# Clip"));
        assert!(text.contains("Answer text"));
    }

    #[test]
    fn test_provider_failure_propagates() {
        let mut mock = MockClipboard { fail: true, ..MockClipboard::default() };
        let err = copy_with_provider(&result_with("Answer text"), ExportFormat::Text, &mut mock)
            .unwrap_err();
        assert!(err.to_string().contains("Mock clipboard error"));
    }

    #[test]
    fn test_oversized_export_rejected_before_copy() {
        let mut mock = MockClipboard::default();
        let huge = "a".repeat(MAX_CLIPBOARD_BYTES + 1);
        let err =
            copy_with_provider(&result_with(&huge), ExportFormat::Text, &mut mock).unwrap_err();
        assert!(err.to_string().contains("too large"));
        assert!(mock.text.is_none());
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(validate_export_text("").unwrap_err().to_string().contains("empty"));
        assert!(validate_export_text("x").is_ok());
    }
}
