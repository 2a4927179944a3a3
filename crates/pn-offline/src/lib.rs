//! PN-Offline — Batch peak normalization over a fixed worker pool
//!
//! Scans one input directory, queues one task per eligible audio file,
//! and normalizes every file to a target peak on a fixed set of worker
//! threads. Each result is written as 32-bit float WAV.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Dispatcher                               │
//! │                                                                  │
//! │  scan ─► [Task1] [Task2] ... [TaskN] ─► SharedQueue              │
//! │                                            │  work_available     │
//! │                     ┌──────────────┬───────┴──────┐              │
//! │                     ▼              ▼              ▼              │
//! │                 pn-worker-0    pn-worker-1 ... pn-worker-K       │
//! │                 decode → stats → normalize → stats → encode      │
//! │                     │              │              │              │
//! │                     └──── complete_one ──► drained ─► stop/join  │
//! │                                                                  │
//! │  LogSink (run log + console, one mutex, never nested with queue) │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pn_offline::{BatchConfig, Dispatcher};
//!
//! let config = BatchConfig::default().with_target_peak(0.9).with_workers(8);
//! let summary = Dispatcher::new(config).run(Path::new("in"), Path::new("out"))?;
//! println!("{} files, {} failed", summary.total(), summary.failed());
//! # Ok::<(), pn_offline::OfflineError>(())
//! ```

mod codec;
mod config;
mod decoder;
mod dispatcher;
mod encoder;
mod error;
mod log_sink;
mod pipeline;
mod pool;
mod queue;
mod scan;
mod task;

pub use codec::*;
pub use config::*;
pub use decoder::*;
pub use dispatcher::*;
pub use encoder::*;
pub use error::*;
pub use log_sink::*;
pub use pipeline::*;
pub use pool::*;
pub use queue::*;
pub use scan::*;
pub use task::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
