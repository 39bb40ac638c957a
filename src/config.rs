use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::loader::{LoadMode, SUPPORTED_EXTENSIONS};

// ---------------------------------------------------------------------------
// Settings – everything a run needs, from TOML and/or the command line
// ---------------------------------------------------------------------------

/// Run settings. Missing TOML keys fall back to [`Settings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one file per series.
    pub data_dir: PathBuf,
    /// File extensions to pick up from `data_dir`.
    pub extensions: Vec<String>,
    /// Worker threads (None = one per logical CPU).
    pub workers: Option<usize>,
    pub load_mode: LoadMode,
    /// Rows in the printed ranking (0 = best pair only).
    pub top: usize,
    /// Min-max scale both series before plotting.
    pub normalize: bool,
    /// Open the plot window after the run.
    pub plot: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            workers: None,
            load_mode: LoadMode::default(),
            top: 5,
            normalize: false,
            plot: true,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("parsing settings TOML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Effective pool size.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Find the best-correlated pair of time series in a directory.
#[derive(Debug, Parser)]
#[command(name = "rusty-corr", version, about)]
pub struct Cli {
    /// Directory holding the time-series files
    pub data_dir: Option<PathBuf>,

    /// TOML settings file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Only load files with this extension (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Decode at most one file at a time
    #[arg(long)]
    pub serialize_loads: bool,

    /// How many ranked pairs to print
    #[arg(long)]
    pub top: Option<usize>,

    /// Min-max scale the plotted series
    #[arg(long)]
    pub normalize: bool,

    /// Print results only, do not open the plot window
    #[arg(long)]
    pub no_plot: bool,
}

impl Cli {
    /// Settings from `--config` (or defaults) with command-line overrides applied.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if self.workers.is_some() {
            settings.workers = self.workers;
        }
        if !self.extensions.is_empty() {
            settings.extensions = self
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect();
        }
        if self.serialize_loads {
            settings.load_mode = LoadMode::Serialized;
        }
        if let Some(top) = self.top {
            settings.top = top;
        }
        if self.normalize {
            settings.normalize = true;
        }
        if self.no_plot {
            settings.plot = false;
        }
        Ok(settings)
    }
}
