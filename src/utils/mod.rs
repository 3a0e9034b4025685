pub mod environment;
pub mod paths;

pub use environment::{EXPORT_DIR_ENV, get_export_dir};
pub use paths::{format_path_with_tilde, is_snapshot_file, safe_open_file, validate_file_size};
