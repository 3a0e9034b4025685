use std::env;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};

// Maximum snapshot size: 50MB
const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Validates that a file's size is within acceptable limits (50MB)
///
/// Takes an open file handle to avoid TOCTOU (time-of-check-time-of-use)
/// race conditions where the file could be modified between the size check
/// and subsequent file operations.
///
/// # Errors
///
/// Returns an error if:
/// - The file metadata cannot be read
/// - The file is larger than 50MB
pub fn validate_file_size(file: &File, path: &Path) -> Result<()> {
    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;

    let file_size = metadata.len();
    if file_size > MAX_FILE_SIZE_BYTES {
        bail!(
            "File too large: {} ({} bytes, max {} bytes)",
            path.display(),
            file_size,
            MAX_FILE_SIZE_BYTES
        );
    }

    Ok(())
}

/// Open a regular file and check its size on the same handle
pub fn safe_open_file(path: &Path) -> Result<File> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
    if !metadata.is_file() {
        bail!("Not a regular file: {}", path.display());
    }
    validate_file_size(&file, path)?;
    Ok(file)
}

/// Whether `path` names a snapshot (`*.json`) file
pub fn is_snapshot_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Formats a path with ~ substitution for the home directory
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use gemini_chat_exporter::utils::format_path_with_tilde;
///
/// let path = PathBuf::from("/Users/alice/Downloads/chat.md");
/// // Returns "~/Downloads/chat.md" if HOME=/Users/alice
/// let formatted = format_path_with_tilde(&path);
/// ```
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, None)
}

/// Internal helper for path formatting with optional home override (for testing)
pub(crate) fn format_path_with_tilde_internal(path: &Path, home_override: Option<&str>) -> String {
    let home_from_env = env::var("HOME").ok();
    let home = home_override.or(home_from_env.as_deref()).filter(|h| !h.is_empty());

    // Whole components only: HOME=/home/al must not shorten /home/alice
    if let Some(home) = home
        && let Ok(rest) = path.strip_prefix(home)
    {
        return if rest.as_os_str().is_empty() {
            "~".to_string()
        } else {
            format!("~/{}", rest.display())
        };
    }

    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    #[test]
    fn test_safe_open_regular_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();
        assert!(safe_open_file(file.path()).is_ok());
    }

    #[test]
    fn test_safe_open_rejects_directory() {
        let dir = TempDir::new().unwrap();
        let err = safe_open_file(dir.path()).unwrap_err();
        assert!(err.to_string().contains("Not a regular file"));
    }

    #[test]
    fn test_safe_open_missing_file() {
        let err = safe_open_file(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }

    #[test]
    fn test_is_snapshot_file() {
        assert!(is_snapshot_file(Path::new("a/b/chat.json")));
        assert!(is_snapshot_file(Path::new("CHAT.JSON")));
        assert!(!is_snapshot_file(Path::new("chat.md")));
        assert!(!is_snapshot_file(Path::new("json")));
    }

    #[test]
    fn test_format_path_with_tilde() {
        let path = PathBuf::from("/Users/testuser/Downloads/chat.md");
        let formatted = format_path_with_tilde_internal(&path, Some("/Users/testuser"));
        assert_eq!(formatted, "~/Downloads/chat.md");

        let path2 = PathBuf::from("/opt/exports/chat.md");
        let formatted2 = format_path_with_tilde_internal(&path2, Some("/Users/testuser"));
        assert_eq!(formatted2, "/opt/exports/chat.md");
    }

    #[test]
    fn test_format_path_with_tilde_respects_component_boundary() {
        let home = Some("/home/al");
        assert_eq!(
            format_path_with_tilde_internal(Path::new("/home/alice/x"), home),
            "/home/alice/x"
        );
        assert_eq!(format_path_with_tilde_internal(Path::new("/home/al/x"), home), "~/x");
        assert_eq!(format_path_with_tilde_internal(Path::new("/home/al"), home), "~");
    }
}
