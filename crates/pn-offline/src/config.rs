//! Configuration types for offline batch normalization

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OfflineError, OfflineResult};

/// Default number of worker threads
pub const DEFAULT_WORKER_COUNT: usize = 4;

/// Default target peak (linear, full scale)
pub const DEFAULT_TARGET_PEAK: f64 = 1.0;

/// Default run log location (relative to the working directory)
pub const DEFAULT_LOG_PATH: &str = "log.txt";

/// Default prefix for output file names
pub const DEFAULT_OUTPUT_PREFIX: &str = "normalised_";

/// Extensions accepted when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["wav", "flac", "ogg", "aiff", "mp3"];

/// Batch normalization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of worker threads (fixed for the whole run)
    pub worker_count: usize,

    /// Peak magnitude every output file is scaled to
    pub target_peak: f64,

    /// Accepted file extensions, matched case-insensitively
    pub extensions: Vec<String>,

    /// Prefix prepended to each input file name to form the output name
    pub output_prefix: String,

    /// Append-only run log
    pub log_path: PathBuf,

    /// Print per-file status lines to stdout/stderr
    pub echo_console: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            target_peak: DEFAULT_TARGET_PEAK,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            echo_console: true,
        }
    }
}

impl BatchConfig {
    /// Load from a YAML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> OfflineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            OfflineError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        serde_yml::from_str(&text).map_err(|e| {
            OfflineError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    /// Set worker count
    pub fn with_workers(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set target peak
    pub fn with_target_peak(mut self, target: f64) -> Self {
        self.target_peak = target;
        self
    }

    /// Replace the extension allow-list
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set run log path
    pub fn with_log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_path = path.into();
        self
    }

    /// Set output file prefix
    pub fn with_output_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    /// Enable or disable console status lines
    pub fn with_console(mut self, echo: bool) -> Self {
        self.echo_console = echo;
        self
    }

    /// Normalized allow-list
    pub fn allow_list(&self) -> ExtensionAllowList {
        ExtensionAllowList::new(&self.extensions)
    }

    /// Validate before any worker starts
    pub fn validate(&self) -> OfflineResult<()> {
        if self.worker_count == 0 {
            return Err(OfflineError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }

        if !self.target_peak.is_finite() || self.target_peak <= 0.0 {
            return Err(OfflineError::InvalidConfig(format!(
                "target peak must be a positive number, got {}",
                self.target_peak
            )));
        }

        if self.target_peak > 1.0 {
            log::warn!(
                "Target peak {} is above full scale; float output will exceed 1.0",
                self.target_peak
            );
        }

        if self.allow_list().is_empty() {
            return Err(OfflineError::InvalidConfig(
                "extension allow-list is empty".to_string(),
            ));
        }

        if self.log_path.as_os_str().is_empty() {
            return Err(OfflineError::InvalidConfig("log path is empty".to_string()));
        }

        Ok(())
    }
}

/// Set of accepted file extensions (lowercase, no leading dot)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionAllowList {
    extensions: BTreeSet<String>,
}

impl ExtensionAllowList {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { extensions }
    }

    /// Check a path's extension against the list
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}
