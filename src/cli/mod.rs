//! Command-line front end: `export`, `batch` and `serve`.

pub mod commands;

pub use commands::{Cli, Commands, run};
