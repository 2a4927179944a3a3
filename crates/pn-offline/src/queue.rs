//! Shared task queue with drain and stop signalling
//!
//! One mutex guards the pending FIFO, the outstanding counter and the stop
//! flag. Two condition variables hang off it:
//!
//! - `work_available`: workers park here while the queue is empty and stop
//!   has not been requested
//! - `drained`: the dispatcher parks here until every pushed task has been
//!   completed
//!
//! Every wait re-checks its predicate under the lock, so spurious wakeups
//! and notifications that arrive before the wait are both harmless.
//!
//! `outstanding` is decremented in [`SharedQueue::complete_one`], not on
//! pop: an empty `pending` does not mean the batch is finished while a
//! worker is still processing its last task.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::task::Task;

/// Result of a blocking pop
#[derive(Debug)]
pub enum Pop {
    /// Next task in FIFO order
    Task(Task),
    /// Stop requested and nothing left to hand out
    Stop,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Task>,
    outstanding: usize,
    stop_requested: bool,
}

/// Producer/consumer queue shared by the dispatcher and the worker pool
#[derive(Debug, Default)]
pub struct SharedQueue {
    state: Mutex<QueueState>,
    work_available: Condvar,
    drained: Condvar,
}

impl SharedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one task. Does not wake workers; call [`Self::notify_work`]
    /// after the batch.
    pub fn push(&self, task: Task) {
        let mut state = self.state.lock();
        state.pending.push_back(task);
        state.outstanding += 1;
    }

    /// Append many tasks under one lock acquisition. Returns how many were
    /// added. Does not wake workers.
    pub fn push_batch<I>(&self, tasks: I) -> usize
    where
        I: IntoIterator<Item = Task>,
    {
        let mut state = self.state.lock();
        let before = state.pending.len();
        state.pending.extend(tasks);
        let added = state.pending.len() - before;
        state.outstanding += added;
        added
    }

    /// Wake every worker parked on "work available"
    pub fn notify_work(&self) {
        // Taking the lock orders the broadcast after any in-flight push
        let _state = self.state.lock();
        self.work_available.notify_all();
    }

    /// Block until a task is available or stop is requested with nothing
    /// left pending.
    pub fn pop_blocking(&self) -> Pop {
        let mut state = self.state.lock();

        while state.pending.is_empty() && !state.stop_requested {
            self.work_available.wait(&mut state);
        }

        match state.pending.pop_front() {
            Some(task) => Pop::Task(task),
            None => Pop::Stop,
        }
    }

    /// Mark one popped task as fully processed. The completion that brings
    /// the batch to zero wakes the drain waiter.
    pub fn complete_one(&self) {
        let mut state = self.state.lock();

        debug_assert!(state.outstanding > 0, "complete_one without a matching push");
        state.outstanding = state.outstanding.saturating_sub(1);

        if state.outstanding == 0 && state.pending.is_empty() {
            self.drained.notify_all();
        }
    }

    /// Block until every pushed task has completed. Returns immediately if
    /// nothing is outstanding.
    pub fn wait_drained(&self) {
        let mut state = self.state.lock();

        while state.outstanding > 0 {
            self.drained.wait(&mut state);
        }
    }

    /// Set the stop flag (never cleared) and wake every parked worker
    pub fn request_stop(&self) {
        let mut state = self.state.lock();
        state.stop_requested = true;
        self.work_available.notify_all();
    }

    /// Tasks pushed but not yet completed
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding
    }

    /// Tasks not yet handed to a worker
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.state.lock().stop_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn task(name: &str) -> Task {
        Task::builder()
            .input(format!("/in/{}", name))
            .output(format!("/out/{}", name))
            .name(name)
            .build()
            .unwrap()
    }

    fn expect_task(pop: Pop) -> Task {
        match pop {
            Pop::Task(task) => task,
            Pop::Stop => panic!("expected a task"),
        }
    }

    #[test]
    fn test_push_counts_outstanding() {
        let queue = SharedQueue::new();
        queue.push(task("a"));
        assert_eq!(queue.push_batch(vec![task("b"), task("c")]), 2);

        assert_eq!(queue.outstanding(), 3);
        assert_eq!(queue.pending_len(), 3);
    }

    #[test]
    fn test_pop_is_fifo() {
        let queue = SharedQueue::new();
        queue.push_batch(["first", "second", "third"].map(task));

        let names: Vec<String> = (0..3)
            .map(|_| expect_task(queue.pop_blocking()).display_name().to_string())
            .collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_pop_does_not_complete() {
        let queue = SharedQueue::new();
        queue.push(task("a"));

        let _task = expect_task(queue.pop_blocking());
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(queue.outstanding(), 1);

        queue.complete_one();
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_pending_still_served_after_stop() {
        let queue = SharedQueue::new();
        queue.push(task("late"));
        queue.request_stop();

        assert!(queue.is_stop_requested());
        assert_eq!(expect_task(queue.pop_blocking()).display_name(), "late");
        assert!(matches!(queue.pop_blocking(), Pop::Stop));
    }

    #[test]
    fn test_wait_drained_with_nothing_pushed() {
        let queue = SharedQueue::new();
        // Level-checked: must not block when nothing is outstanding
        queue.wait_drained();
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_drain_waits_for_straggler() {
        let queue = Arc::new(SharedQueue::new());
        queue.push(task("slow"));

        let popped = expect_task(queue.pop_blocking());
        assert_eq!(queue.pending_len(), 0);

        let finished = Arc::new(AtomicBool::new(false));
        let worker = {
            let queue = Arc::clone(&queue);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                drop(popped);
                finished.store(true, Ordering::SeqCst);
                queue.complete_one();
            })
        };

        // Queue is empty, but the drain must wait for the in-flight task
        queue.wait_drained();
        assert!(finished.load(Ordering::SeqCst));
        worker.join().unwrap();
    }

    #[test]
    fn test_stop_wakes_every_waiter() {
        let queue = Arc::new(SharedQueue::new());
        let stopped = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let stopped = Arc::clone(&stopped);
                thread::spawn(move || {
                    if let Pop::Stop = queue.pop_blocking() {
                        stopped.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        // Let some of them park before the broadcast; the rest see the flag
        thread::sleep(Duration::from_millis(20));
        queue.request_stop();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stopped.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_notify_wakes_parked_worker() {
        let queue = Arc::new(SharedQueue::new());

        let worker = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let task = expect_task(queue.pop_blocking());
                queue.complete_one();
                task.display_name().to_string()
            })
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(task("wake"));
        queue.notify_work();

        queue.wait_drained();
        assert_eq!(worker.join().unwrap(), "wake");
    }
}
