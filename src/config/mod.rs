//! Exporter configuration.
//!
//! Every threshold of the extraction pipeline is a named field here. Values
//! come from a TOML file; anything missing falls back to its default.
//!
//! ```toml
//! [loader]
//! interval_ms = 500
//! stuck_threshold = 3
//!
//! [dedup]
//! key = "full"
//!
//! [output]
//! directory = "/home/me/chat-exports"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::export::ExportFormat;

const CONFIG_DIR_NAME: &str = "gemini-chat-exporter";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub loader: LoaderPolicy,
    pub expander: ExpanderPolicy,
    pub scanner: ScanPolicy,
    pub dedup: DedupPolicy,
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Bounded retry policy for the history loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderPolicy {
    /// Pause after each scroll-to-top
    pub interval_ms: u64,
    /// Iterations without growth before the loader perturbs or stops
    pub stuck_threshold: usize,
    pub max_perturbations: usize,
    /// How far down a perturbation scrolls before returning to the top
    pub perturbation_offset: f64,
    pub max_iterations: usize,
    /// Minimum overflow for an element to count as a scroll container
    pub overflow_margin: f64,
    /// Sweep step as a fraction of the viewport height
    pub sweep_step_ratio: f64,
    pub sweep_pause_ms: u64,
    /// Ceiling on sweep steps for pages reporting an absurd scroll height
    pub max_sweep_steps: usize,
    pub progress_every: usize,
}

impl Default for LoaderPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            stuck_threshold: 3,
            max_perturbations: 3,
            perturbation_offset: 200.0,
            max_iterations: 500,
            overflow_margin: 50.0,
            sweep_step_ratio: 0.8,
            sweep_pause_ms: 100,
            max_sweep_steps: 1000,
            progress_every: 5,
        }
    }
}

impl LoaderPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn sweep_pause(&self) -> Duration {
        Duration::from_millis(self.sweep_pause_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderPolicy {
    pub max_passes: usize,
    pub click_pause_ms: u64,
    /// Longest label text considered a "show more" control
    pub max_label_chars: usize,
}

impl Default for ExpanderPolicy {
    fn default() -> Self {
        Self { max_passes: 5, click_pause_ms: 300, max_label_chars: 40 }
    }
}

impl ExpanderPolicy {
    pub fn click_pause(&self) -> Duration {
        Duration::from_millis(self.click_pause_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanPolicy {
    pub min_content_chars: usize,
    /// Upper bound for blocks picked by the content-region strategy
    pub max_block_chars: usize,
    /// Share of an element's text that must be its own for the content-region strategy
    pub own_text_ratio: f64,
    /// Ancestors inspected for role hints
    pub ancestor_depth: usize,
    /// Longest text the question/imperative heuristic applies to
    pub short_text_chars: usize,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            min_content_chars: 5,
            max_block_chars: 20_000,
            own_text_ratio: 0.5,
            ancestor_depth: 3,
            short_text_chars: 150,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    /// First `prefix_chars` characters of the content
    #[default]
    Prefix,
    /// The whole content
    Full,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupPolicy {
    pub key: DedupKey,
    pub prefix_chars: usize,
    pub include_role: bool,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self { key: DedupKey::Prefix, prefix_chars: 150, include_role: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Hosts extraction is allowed to run on
    pub hosts: Vec<String>,
    /// Title used when the page has none
    pub default_title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self { hosts: vec!["gemini.google.com".to_string()], default_title: "Gemini Chat".to_string() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: Option<PathBuf>,
    pub format: ExportFormat,
}

impl ExporterConfig {
    /// Reject settings that would stall or break the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.loader.stuck_threshold == 0 {
            bail!("loader.stuck_threshold must be at least 1");
        }
        if self.loader.max_iterations == 0 {
            bail!("loader.max_iterations must be at least 1");
        }
        if self.loader.sweep_step_ratio.is_nan() || self.loader.sweep_step_ratio <= 0.0 {
            bail!("loader.sweep_step_ratio must be positive");
        }
        if self.loader.max_sweep_steps == 0 {
            bail!("loader.max_sweep_steps must be at least 1");
        }
        if self.loader.progress_every == 0 {
            bail!("loader.progress_every must be at least 1");
        }
        if self.dedup.key == DedupKey::Prefix && self.dedup.prefix_chars == 0 {
            bail!("dedup.prefix_chars must be at least 1 when key = \"prefix\"");
        }
        if !(0.0..=1.0).contains(&self.scanner.own_text_ratio) {
            bail!("scanner.own_text_ratio must be between 0 and 1");
        }
        if self.site.hosts.is_empty() {
            bail!("site.hosts must list at least one host");
        }
        Ok(())
    }
}

/// Loads [`ExporterConfig`] from TOML
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<ExporterConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::load_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn load_str(content: &str) -> Result<ExporterConfig> {
        let config: ExporterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path, else the per-user config file if present, else defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<ExporterConfig> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(ExporterConfig::default()),
        }
    }
}

/// `<config dir>/gemini-chat-exporter/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
