//! Shared run log and console output
//!
//! A single append-only file plus stdout/stderr, all behind one mutex.
//! Every call writes its whole message under one lock acquisition, so
//! concurrent workers interleave whole blocks, never partial lines.
//!
//! This mutex is never held while the queue mutex is taken, and no code
//! path locks the queue from inside the sink.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

const RULE: &str = "========================================";
const RULE_WIDE: &str = "==========================================";

/// `ctime`-style local timestamp, e.g. `Tue Oct  6 14:03:11 2026`
pub fn timestamp() -> String {
    Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}

#[derive(Debug, Default)]
struct SinkState {
    file: Option<File>,
    open_failed: bool,
}

/// Mutex-guarded run log shared by the dispatcher and all workers
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    echo_console: bool,
    state: Mutex<SinkState>,
}

impl LogSink {
    /// Create a sink. The file is opened lazily on the first append.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            echo_console: true,
            state: Mutex::new(SinkState::default()),
        }
    }

    /// Enable or disable stdout/stderr status lines
    pub fn with_console(mut self, echo: bool) -> Self {
        self.echo_console = echo;
        self
    }

    /// Append `text` (plus a trailing newline) to the run log
    pub fn append(&self, text: &str) {
        let mut state = self.state.lock();
        Self::write_locked(&mut state, &self.path, text);
    }

    /// Status line on stdout
    pub fn status(&self, message: &str) {
        if !self.echo_console {
            return;
        }
        let _state = self.state.lock();
        println!("{}", message);
    }

    /// Diagnostic line on stderr
    pub fn error(&self, message: &str) {
        if !self.echo_console {
            return;
        }
        let _state = self.state.lock();
        eprintln!("{}", message);
    }

    /// Open the per-task bracket. The "ended" bracket is written when the
    /// returned guard drops, on every exit path.
    pub fn begin_task(&self, name: &str) -> TaskLog<'_> {
        self.append(&format!(
            "\n{}\nProcessing started for {}: {}\n{}",
            RULE,
            name,
            timestamp(),
            RULE_WIDE
        ));

        TaskLog {
            sink: self,
            name: name.to_string(),
        }
    }

    fn write_locked(state: &mut SinkState, path: &Path, text: &str) {
        if state.file.is_none() {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => state.file = Some(file),
                Err(e) => {
                    if !state.open_failed {
                        state.open_failed = true;
                        log::warn!("Could not open the log file {}: {}", path.display(), e);
                    }
                    return;
                }
            }
        }

        if let Some(file) = state.file.as_mut() {
            let result = writeln!(file, "{}", text).and_then(|_| file.flush());
            if let Err(e) = result {
                log::warn!("Failed to append to {}: {}", path.display(), e);
            }
        }
    }
}

/// Scoped per-task log context
pub struct TaskLog<'a> {
    sink: &'a LogSink,
    name: String,
}

impl TaskLog<'_> {
    /// Append one line or block inside this task's bracket
    pub fn line(&self, message: &str) {
        self.sink.append(message);
    }

    /// Append several lines as one contiguous block
    pub fn block<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines
            .into_iter()
            .map(|l| l.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        self.sink.append(&text);
    }
}

impl Drop for TaskLog<'_> {
    fn drop(&mut self) {
        self.sink.append(&format!(
            "\n{}\nProcessing Ended for {}: {}\n\n{}",
            RULE,
            self.name,
            timestamp(),
            RULE
        ));
    }
}
