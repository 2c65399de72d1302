//! Cooperative deferred-task queue.
//!
//! This module provides [`DispatchQueue`], an explicit "next turn"
//! abstraction: closures posted to the queue do not run until the queue
//! owner drains it. Registry mutations use it to coalesce bursts of
//! synchronous registration calls before observers react — each call posts
//! its own task, and a single [`drain`](DispatchQueue::drain) delivers them
//! all in post order.
//!
//! # Example
//!
//! ```
//! use sheetkit_core::DispatchQueue;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let queue = DispatchQueue::new();
//! let counter = Arc::new(AtomicUsize::new(0));
//!
//! let counter_clone = counter.clone();
//! queue.post(move || {
//!     counter_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! assert_eq!(counter.load(Ordering::SeqCst), 0); // nothing ran yet
//! queue.drain();
//! assert_eq!(counter.load(Ordering::SeqCst), 1);
//! ```

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::logging::targets;

/// A deferred task waiting in a [`DispatchQueue`].
type QueuedTask = Box<dyn FnOnce() + Send>;

/// A FIFO queue of deferred closures, drained cooperatively by its owner.
///
/// Tasks posted while the queue is draining are executed in the same drain
/// pass, after the tasks that were already queued. The internal lock is
/// never held while a task runs, so tasks may freely post more tasks.
#[derive(Default)]
pub struct DispatchQueue {
    tasks: Mutex<VecDeque<QueuedTask>>,
}

impl DispatchQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Post a task to run on the next drain.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.tasks.lock().push_back(Box::new(task));
    }

    /// Number of tasks currently waiting.
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Check whether any tasks are waiting.
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Run every pending task, including tasks posted during the drain.
    ///
    /// Returns the number of tasks executed.
    pub fn drain(&self) -> usize {
        let mut executed = 0;
        loop {
            let task = self.tasks.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    executed += 1;
                }
                None => break,
            }
        }
        if executed > 0 {
            tracing::trace!(target: targets::QUEUE, executed, "drained dispatch queue");
        }
        executed
    }

    /// Discard every pending task without running it.
    pub fn clear(&self) {
        self.tasks.lock().clear();
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

static_assertions::assert_impl_all!(DispatchQueue: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_post_then_drain() {
        let queue = DispatchQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter_clone = counter.clone();
            queue.post(move || {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(queue.pending(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let executed = queue.drain();
        assert_eq!(executed, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_tasks_run_in_post_order() {
        let queue = DispatchQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order_clone = order.clone();
            queue.post(move || {
                order_clone.lock().push(i);
            });
        }

        queue.drain();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reentrant_post_during_drain() {
        let queue = Arc::new(DispatchQueue::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let queue_clone = queue.clone();
        let counter_clone = counter.clone();
        queue.post(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            let inner_counter = counter_clone.clone();
            queue_clone.post(move || {
                inner_counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        // The nested task runs in the same drain pass.
        let executed = queue.drain();
        assert_eq!(executed, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_discards_tasks() {
        let queue = DispatchQueue::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        queue.post(move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        queue.clear();
        assert_eq!(queue.drain(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
