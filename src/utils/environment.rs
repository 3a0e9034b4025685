use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default export directory
pub const EXPORT_DIR_ENV: &str = "GEMINI_EXPORT_DIR";

/// Directory exports are written to when no output path is given.
///
/// Precedence: `configured` (flag or config file), `$GEMINI_EXPORT_DIR`, the
/// user's download directory, then the current directory.
pub fn get_export_dir(configured: Option<&Path>) -> PathBuf {
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    if let Ok(dir) = env::var(EXPORT_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn test_configured_dir_wins() {
        let dir = get_export_dir(Some(Path::new("/tmp/exports")));
        assert_eq!(dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_env_override() {
        let original = env::var(EXPORT_DIR_ENV).ok();

        // SAFETY: Only this test touches GEMINI_EXPORT_DIR, and it restores the
        // original value afterwards
        unsafe {
            env::set_var(EXPORT_DIR_ENV, "/srv/chat-exports");
        }

        assert_eq!(get_export_dir(None), PathBuf::from("/srv/chat-exports"));

        unsafe {
            match original {
                Some(value) => env::set_var(EXPORT_DIR_ENV, value),
                None => env::remove_var(EXPORT_DIR_ENV),
            }
        }
    }
}
