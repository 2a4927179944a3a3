//! Per-file normalization tasks

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{OfflineError, OfflineResult};

/// Unique task identifier (process-wide, monotonically increasing)
pub type TaskId = u64;

static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// One unit of work: normalize one input file into one output file.
///
/// Immutable once built. Consumed exactly once by exactly one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    input_path: PathBuf,
    output_path: PathBuf,
    display_name: String,
    target_peak: f64,
}

impl Task {
    /// Create new task builder
    pub fn builder() -> TaskBuilder {
        TaskBuilder::default()
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Name used in log brackets and console lines
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn target_peak(&self) -> f64 {
        self.target_peak
    }
}

/// Task builder for fluent API
#[derive(Debug, Default)]
pub struct TaskBuilder {
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    display_name: Option<String>,
    target_peak: Option<f64>,
}

impl TaskBuilder {
    /// Set input file
    pub fn input<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set output file
    pub fn output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Set display name (defaults to the input file name)
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set target peak (defaults to 1.0)
    pub fn target_peak(mut self, target: f64) -> Self {
        self.target_peak = Some(target);
        self
    }

    /// Build the task
    pub fn build(self) -> OfflineResult<Task> {
        let input_path = self.input_path.ok_or_else(|| {
            OfflineError::InvalidConfig("Input path is required".to_string())
        })?;

        let output_path = self.output_path.ok_or_else(|| {
            OfflineError::InvalidConfig("Output path is required".to_string())
        })?;

        let id = TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        let display_name = self.display_name.unwrap_or_else(|| {
            input_path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("Task {}", id))
        });

        Ok(Task {
            id,
            input_path,
            output_path,
            display_name,
            target_peak: self.target_peak.unwrap_or(crate::config::DEFAULT_TARGET_PEAK),
        })
    }
}

/// How a task ended. Every variant counts as "completed" for the drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Scaled to the target peak and saved
    Normalized,
    /// All-silent input, saved unchanged
    Silent,
    /// Input could not be decoded
    LoadFailed,
    /// Output could not be written
    SaveFailed,
    /// The pipeline panicked; caught at the worker boundary
    Aborted,
}

impl TaskOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::LoadFailed | Self::SaveFailed | Self::Aborted)
    }
}
