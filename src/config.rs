//! TOML configuration for extentdigest.
//!
//! Every section carries compiled-in defaults, so an empty or partial file is
//! valid. The file is located through `--config`, then the
//! `EXTENTDIGEST_CONFIG` environment variable, then `./extentdigest.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "EXTENTDIGEST_CONFIG";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "extentdigest.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub columns: ColumnConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub steps: StepsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve the configuration for this run.
    ///
    /// An explicit path must load; the environment variable and the local
    /// file fall through to defaults with a warning when they are unusable.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default()),
        }
    }

    /// Try to load configuration from, in order:
    /// 1. The path in `EXTENTDIGEST_CONFIG`.
    /// 2. `./extentdigest.toml`.
    /// 3. Compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "EXTENTDIGEST_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            match Self::load(local) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %local.display(),
                        error = %e,
                        "local config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Unit that per-record durations are expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationUnit {
    #[default]
    Minutes,
    Seconds,
}

impl DurationUnit {
    /// Convert a signed number of milliseconds into this unit.
    pub fn from_millis(self, millis: i64) -> f64 {
        let secs = millis as f64 / 1000.0;
        match self {
            DurationUnit::Minutes => secs / 60.0,
            DurationUnit::Seconds => secs,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationUnit::Minutes => "minutes",
            DurationUnit::Seconds => "seconds",
        }
    }
}

/// Order of rows in the summary table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowOrder {
    /// Order in which each test name first appears in the input batch.
    #[default]
    FirstSeen,
    /// Largest total duration first; ties keep first-seen order.
    TotalDescending,
}

/// Settings for turning raw records into duration summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// chrono `strftime` pattern both timestamps must match exactly.
    pub timestamp_format: String,
    /// Replace negative durations (end before start) with zero.
    pub clamp_negative_durations: bool,
    pub duration_unit: DurationUnit,
    pub row_order: RowOrder,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            timestamp_format: "%m/%d/%Y %H:%M:%S".to_string(),
            clamp_negative_durations: true,
            duration_unit: DurationUnit::Minutes,
            row_order: RowOrder::FirstSeen,
        }
    }
}

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Header names of the run-details CSV, both when reading and writing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub report: String,
    pub name: String,
    pub status: String,
    pub start: String,
    pub end: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            report: "Report".to_string(),
            name: "Test Name".to_string(),
            status: "Test Status".to_string(),
            start: "Test Start Time".to_string(),
            end: "Test End Time".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Report discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions treated as reports, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Name of the processed-files log, relative to the scanned folder.
    pub processed_log: PathBuf,
    /// Ignore the processed-files log and start from an empty set.
    pub reprocess_all: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["html".to_string(), "htm".to_string()],
            processed_log: PathBuf::from("processed_files.csv"),
            reprocess_all: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Column names used when splitting pipe-delimited design steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StepsConfig {
    pub input_column: String,
    pub description_column: String,
    pub expected_column: String,
}

impl Default for StepsConfig {
    fn default() -> Self {
        Self {
            input_column: "Input".to_string(),
            description_column: "Description (Design Steps)".to_string(),
            expected_column: "Expected (Design Steps)".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum tracing level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
