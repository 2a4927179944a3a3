//! Fixed-size worker pool
//!
//! Every worker runs the same state machine against one shared
//! [`BatchContext`]:
//!
//! ```text
//!   Idle ──pop: Task──► Processing(task) ──complete_one──► Idle
//!    │
//!    └──pop: Stop──► Terminated
//! ```
//!
//! A worker only parks inside [`SharedQueue::pop_blocking`]. The pipeline
//! runs behind `catch_unwind`, so `complete_one` follows every pop and the
//! dispatcher's drain cannot hang on a panicking task.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::codec::AudioCodec;
use crate::error::{OfflineError, OfflineResult};
use crate::log_sink::LogSink;
use crate::pipeline::process_task;
use crate::queue::{Pop, SharedQueue};
use crate::task::{Task, TaskOutcome};

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything a batch shares between the dispatcher and its workers.
///
/// Built once per run and handed to each worker as an `Arc`; independent
/// runs in one process never share state.
pub struct BatchContext {
    pub queue: SharedQueue,
    pub sink: LogSink,
    pub codec: Arc<dyn AudioCodec>,
}

impl BatchContext {
    pub fn new(sink: LogSink, codec: Arc<dyn AudioCodec>) -> Self {
        Self {
            queue: SharedQueue::new(),
            sink,
            codec,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH SUMMARY
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-outcome task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub normalized: usize,
    pub silent: usize,
    pub load_failed: usize,
    pub save_failed: usize,
    pub aborted: usize,
}

impl BatchSummary {
    /// Count one finished task
    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Normalized => self.normalized += 1,
            TaskOutcome::Silent => self.silent += 1,
            TaskOutcome::LoadFailed => self.load_failed += 1,
            TaskOutcome::SaveFailed => self.save_failed += 1,
            TaskOutcome::Aborted => self.aborted += 1,
        }
    }

    /// Add another summary's counts into this one
    pub fn merge(&mut self, other: &BatchSummary) {
        self.normalized += other.normalized;
        self.silent += other.silent;
        self.load_failed += other.load_failed;
        self.save_failed += other.save_failed;
        self.aborted += other.aborted;
    }

    pub fn failed(&self) -> usize {
        self.load_failed + self.save_failed + self.aborted
    }

    pub fn total(&self) -> usize {
        self.normalized + self.silent + self.failed()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKER
// ═══════════════════════════════════════════════════════════════════════════════

/// Worker lifecycle
#[derive(Debug)]
pub enum WorkerState {
    Idle,
    Processing(Task),
    Terminated,
}

/// What one worker did before terminating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    pub summary: BatchSummary,
}

/// Worker thread main loop. Returns once stop is requested and the queue
/// is empty.
pub fn run_worker(worker: usize, context: &BatchContext) -> WorkerReport {
    let mut report = WorkerReport {
        worker,
        summary: BatchSummary::default(),
    };
    let mut state = WorkerState::Idle;

    loop {
        state = match state {
            WorkerState::Idle => match context.queue.pop_blocking() {
                Pop::Task(task) => WorkerState::Processing(task),
                Pop::Stop => WorkerState::Terminated,
            },
            WorkerState::Processing(task) => {
                let outcome = run_guarded(&task, context);
                if outcome.is_failure() {
                    log::warn!("{} failed: {:?}", task.display_name(), outcome);
                }
                context.queue.complete_one();
                report.summary.record(outcome);
                WorkerState::Idle
            }
            WorkerState::Terminated => break,
        };
    }

    log::debug!(
        "worker {} terminated after {} tasks",
        worker,
        report.summary.total()
    );
    report
}

/// Run the pipeline, converting a panic into [`TaskOutcome::Aborted`]
fn run_guarded(task: &Task, context: &BatchContext) -> TaskOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| {
        process_task(task, context.codec.as_ref(), &context.sink)
    }));

    result.unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());

        log::error!("task {} ({}) panicked: {}", task.id(), task.display_name(), message);
        context
            .sink
            .error(&format!("Failed to process: {}", task.input_path().display()));
        TaskOutcome::Aborted
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORKER POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed set of named worker threads
pub struct WorkerPool {
    context: Arc<BatchContext>,
    workers: Vec<JoinHandle<WorkerReport>>,
}

impl WorkerPool {
    /// Spawn up to `size` workers. Threads that fail to spawn are logged
    /// and skipped; the pool is an error only if none started.
    pub fn spawn(size: usize, context: Arc<BatchContext>) -> OfflineResult<Self> {
        let mut workers = Vec::with_capacity(size);
        let mut last_error = None;

        for i in 0..size {
            let ctx = Arc::clone(&context);

            match thread::Builder::new()
                .name(format!("pn-worker-{}", i))
                .spawn(move || run_worker(i, &ctx))
            {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    log::error!(
                        "Failed to spawn worker thread {}: {}. Batch will run degraded.",
                        i,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        if workers.is_empty() {
            let reason = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "pool size is zero".to_string());
            return Err(OfflineError::WorkerSpawn(reason));
        }

        log::info!("started {} of {} workers", workers.len(), size);
        Ok(Self { context, workers })
    }

    /// Number of running workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Request stop and join every worker
    pub fn shutdown(&mut self) -> Vec<WorkerReport> {
        self.context.queue.request_stop();

        let mut reports = Vec::with_capacity(self.workers.len());
        for handle in self.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("pn-worker").to_string();
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => log::error!("{} exited abnormally", name),
            }
        }
        reports
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.shutdown();
        }
    }
}
