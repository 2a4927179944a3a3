//! Batch dispatcher
//!
//! Owns one run: validates the configuration, prepares directories,
//! enumerates tasks, then drives the pool through
//! push → spawn → notify → drain → stop → join.

use std::path::Path;
use std::sync::Arc;

use crate::codec::{AudioCodec, FileCodec};
use crate::config::BatchConfig;
use crate::error::OfflineResult;
use crate::log_sink::LogSink;
use crate::pool::{BatchContext, BatchSummary, WorkerPool};
use crate::scan::{collect_tasks, prepare_directories};
use crate::task::Task;

/// Runs one batch at a time with a fixed configuration
pub struct Dispatcher {
    config: BatchConfig,
    codec: Arc<dyn AudioCodec>,
}

impl Dispatcher {
    /// Dispatcher backed by the file codec
    pub fn new(config: BatchConfig) -> Self {
        Self {
            config,
            codec: Arc::new(FileCodec),
        }
    }

    /// Replace the codec (tests use in-memory fakes)
    pub fn with_codec(mut self, codec: Arc<dyn AudioCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Normalize every eligible file in `input_dir` into `output_dir`.
    ///
    /// Configuration problems are returned as errors before any worker
    /// starts. Per-file failures only show up in the summary.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> OfflineResult<BatchSummary> {
        self.config.validate()?;
        let sink = self.sink();

        sink.status(&format!("Processing audio files from: {}", input_dir.display()));
        sink.status(&format!("Saving normalized files to: {}", output_dir.display()));
        sink.status(&format!("Target peak level: {}", self.config.target_peak));

        if prepare_directories(input_dir, output_dir)? {
            sink.status(&format!("Created output directory: {}", output_dir.display()));
        }

        let tasks = collect_tasks(input_dir, output_dir, &self.config)?;
        log::info!("{} eligible files in {}", tasks.len(), input_dir.display());

        self.execute(sink, tasks)
    }

    /// Run pre-built tasks through the pool
    pub fn run_tasks(&self, tasks: Vec<Task>) -> OfflineResult<BatchSummary> {
        self.config.validate()?;
        self.execute(self.sink(), tasks)
    }

    fn sink(&self) -> LogSink {
        LogSink::new(&self.config.log_path).with_console(self.config.echo_console)
    }

    fn execute(&self, sink: LogSink, tasks: Vec<Task>) -> OfflineResult<BatchSummary> {
        let context = Arc::new(BatchContext::new(sink, Arc::clone(&self.codec)));

        let queued = context.queue.push_batch(tasks);
        if queued == 0 {
            context.sink.status("No audio files found to process.");
            return Ok(BatchSummary::default());
        }

        let mut pool = WorkerPool::spawn(self.config.worker_count, Arc::clone(&context))?;
        context.queue.notify_work();

        context.queue.wait_drained();
        log::debug!("queue drained after {} tasks", queued);

        let mut summary = BatchSummary::default();
        for report in pool.shutdown() {
            summary.merge(&report.summary);
        }

        context.sink.status(&format!(
            "\nBatch processing completed. Total files processed: {} (normalized {}, silent {}, failed {})",
            summary.total(),
            summary.normalized,
            summary.silent,
            summary.failed()
        ));

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OfflineError;
    use tempfile::tempdir;

    fn quiet_config(dir: &Path) -> BatchConfig {
        BatchConfig::default()
            .with_log_path(dir.join("log.txt"))
            .with_console(false)
    }

    #[test]
    fn test_empty_input_returns_immediately() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();

        let summary = Dispatcher::new(quiet_config(output.path()))
            .run(input.path(), output.path())
            .unwrap();
        assert_eq!(summary, BatchSummary::default());
    }

    #[test]
    fn test_invalid_config_rejected_before_scan() {
        let input = tempdir().unwrap();
        let config = quiet_config(input.path()).with_workers(0);

        let result = Dispatcher::new(config).run(input.path(), &input.path().join("out"));
        assert!(matches!(result, Err(OfflineError::InvalidConfig(_))));
        assert!(!input.path().join("out").exists());
    }

    #[test]
    fn test_run_tasks_with_no_tasks() {
        let dir = tempdir().unwrap();
        let summary = Dispatcher::new(quiet_config(dir.path()))
            .run_tasks(Vec::new())
            .unwrap();
        assert_eq!(summary.total(), 0);
    }
}
