use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::clipboard::copy_export;
use crate::config::{ConfigLoader, ExporterConfig};
use crate::dom::SnapshotPage;
use crate::export::{ExportFormat, export_filename, format_export, write_export, write_export_to};
use crate::extractor::{extract_chat, handle_request};
use crate::models::{
    ExtractionResult, ProgressEvent, ProgressMessage, ProgressSink, Request, Response,
};
use crate::utils::{format_path_with_tilde, get_export_dir, is_snapshot_file};

#[derive(Parser)]
#[command(name = "gemini-chat-exporter")]
#[command(version = "0.1.0")]
#[command(about = "Export Gemini conversations to text, JSON or Markdown", long_about = None)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract one conversation snapshot and write the export
    Export {
        /// Snapshot file of the conversation page
        snapshot: PathBuf,

        /// Output format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        /// Write to exactly this file
        #[arg(short, long, conflicts_with_all = ["out_dir", "stdout"])]
        output: Option<PathBuf>,

        /// Directory for the generated filename
        #[arg(long, conflicts_with = "stdout")]
        out_dir: Option<PathBuf>,

        /// Print the export instead of writing a file
        #[arg(long)]
        stdout: bool,

        /// Also copy the export to the clipboard
        #[arg(long)]
        copy: bool,
    },
    /// Export every snapshot under a directory
    Batch {
        /// Directory searched recursively for *.json snapshots
        dir: PathBuf,

        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Answer extractChat requests on stdin with JSON lines on stdout
    Serve {
        /// Snapshot file serving as the open page
        #[arg(long)]
        snapshot: PathBuf,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Export { snapshot, format, output, out_dir, stdout, copy }) => {
            let format = format.unwrap_or(config.output.format);
            let target = if stdout {
                ExportTarget::Stdout
            } else if let Some(path) = output {
                ExportTarget::File(path)
            } else {
                ExportTarget::Dir(out_dir.or_else(|| config.output.directory.clone()))
            };
            export_snapshot(&snapshot, &config, format, target, copy)?;
        }
        Some(Commands::Batch { dir, format, out_dir }) => {
            let format = format.unwrap_or(config.output.format);
            let out_dir = get_export_dir(out_dir.as_deref().or(config.output.directory.as_deref()));
            batch_export(&dir, &config, format, &out_dir)?;
        }
        Some(Commands::Serve { snapshot }) => {
            let mut page = SnapshotPage::load(&snapshot)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            serve(stdin.lock(), stdout.lock(), &mut page, &config)?;
        }
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

enum ExportTarget {
    Stdout,
    File(PathBuf),
    Dir(Option<PathBuf>),
}

fn print_progress(event: ProgressEvent) {
    eprintln!("{}", event.message);
}

fn extract_snapshot(
    path: &Path,
    config: &ExporterConfig,
    sink: &mut dyn ProgressSink,
) -> Result<ExtractionResult> {
    let mut page = SnapshotPage::load(path)?;
    let result = extract_chat(&mut page, config, sink)
        .with_context(|| format!("Extraction failed for {}", path.display()))?;
    Ok(result)
}

fn export_snapshot(
    snapshot: &Path,
    config: &ExporterConfig,
    format: ExportFormat,
    target: ExportTarget,
    copy: bool,
) -> Result<()> {
    let mut progress = print_progress;
    let result = extract_snapshot(snapshot, config, &mut progress)?;

    match target {
        ExportTarget::Stdout => {
            let content = format_export(&result, format)?;
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
        ExportTarget::File(path) => {
            let path = write_export_to(&result, format, &path)?;
            println!("Exported {} messages to {}", result.message_count, format_path_with_tilde(&path));
        }
        ExportTarget::Dir(dir) => {
            let path = write_export(&result, format, &get_export_dir(dir.as_deref()))?;
            println!("Exported {} messages to {}", result.message_count, format_path_with_tilde(&path));
        }
    }

    if copy {
        // The export is already written; a missing clipboard only costs the copy.
        match copy_export(&result, format) {
            Ok(bytes) => eprintln!("Copied {} bytes to clipboard", bytes),
            Err(e) => eprintln!("Warning: Failed to copy to clipboard: {:#}", e),
        }
    }

    Ok(())
}

fn find_snapshots(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_snapshot_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// `name.ext`, then `name_2.ext`, `name_3.ext`... for titles seen earlier in the batch
fn unique_filename(name: String, used: &mut HashMap<String, usize>) -> String {
    let count = used.entry(name.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return name;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, count, ext),
        None => format!("{}_{}", name, count),
    }
}

fn batch_export(
    dir: &Path,
    config: &ExporterConfig,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<()> {
    let snapshots = find_snapshots(dir)?;
    if snapshots.is_empty() {
        bail!("No snapshot files found in {}", dir.display());
    }

    // Sessions share nothing, so pages extract in parallel; writing stays
    // sequential to keep filenames unique.
    let extracted: Vec<(PathBuf, Result<ExtractionResult>)> = snapshots
        .par_iter()
        .map(|path| {
            let mut progress = |event: ProgressEvent| {
                debug!(snapshot = %path.display(), status = ?event.status, "{}", event.message);
            };
            (path.clone(), extract_snapshot(path, config, &mut progress))
        })
        .collect();

    let today = chrono::Local::now().date_naive();
    let mut used = HashMap::new();
    let mut exported = 0;
    let mut failed = 0;
    let mut messages = 0;

    for (snapshot, result) in extracted {
        let written = result.and_then(|result| {
            let name = unique_filename(export_filename(&result.title, format, today), &mut used);
            let path = write_export_to(&result, format, &out_dir.join(name))?;
            Ok((path, result.message_count))
        });
        match written {
            Ok((path, count)) => {
                exported += 1;
                messages += count;
                debug!(snapshot = %snapshot.display(), export = %path.display(), "Exported snapshot");
            }
            Err(e) => {
                failed += 1;
                eprintln!("Warning: {}: {:#}", snapshot.display(), e);
            }
        }
    }

    println!("Batch Export Summary");
    println!("====================");
    println!("Snapshots: {}", snapshots.len());
    println!("  Exported: {}", exported);
    println!("  Failed: {}", failed);
    println!("Messages: {}", messages);
    println!("Output directory: {}", format_path_with_tilde(out_dir));

    let failure_rate = failed as f64 / snapshots.len() as f64;
    if failure_rate > 0.5 {
        bail!(
            "Batch export failed: {}/{} snapshots failed ({}% failure rate)",
            failed,
            snapshots.len(),
            (failure_rate * 100.0) as u32
        );
    }

    Ok(())
}

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Answer each request line with progress lines and one response line.
///
/// Blank lines are ignored. Lines that are not a known request get a failure
/// response; the loop ends at end of input.
pub(crate) fn serve<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    page: &mut SnapshotPage,
    config: &ExporterConfig,
) -> Result<()> {
    for line in input.lines() {
        let line = line.context("Failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                debug!(?request, "Handling request");
                let mut sink = |event: ProgressEvent| {
                    // Progress is best effort; the response write reports broken pipes.
                    let _ = write_json_line(&mut output, &ProgressMessage::from(event));
                };
                handle_request(&request, page, config, &mut sink)
            }
            Err(e) => {
                warn!(error = %e, "Rejected request");
                Response::failure(format!("Unsupported request: {}", e))
            }
        };
        write_json_line(&mut output, &response).context("Failed to write response")?;
    }
    Ok(())
}
