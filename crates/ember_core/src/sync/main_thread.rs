//! Callback queue drained on the main thread.

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::warn;

type Callback<T> = Box<dyn FnOnce(&mut T) + Send + 'static>;

/// Receives callbacks from any thread and runs them against `T` on the
/// thread that calls [`drain`](Self::drain).
pub struct MainThreadQueue<T> {
    sender: Sender<Callback<T>>,
    receiver: Receiver<Callback<T>>,
}

impl<T> MainThreadQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Creates a producer handle (clone for multiple producers).
    #[must_use]
    pub fn handle(&self) -> MainThreadHandle<T> {
        MainThreadHandle {
            sender: self.sender.clone(),
        }
    }

    /// Runs every callback queued so far, in order. Returns how many ran.
    ///
    /// Callbacks enqueued while draining run on the next drain.
    pub fn drain(&self, target: &mut T) -> usize {
        let queued = self.receiver.len();
        let mut ran = 0;
        while ran < queued {
            let Ok(callback) = self.receiver.try_recv() else {
                break;
            };
            callback(target);
            ran += 1;
        }
        ran
    }

    /// Number of callbacks waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True when nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T> Default for MainThreadQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of a [`MainThreadQueue`].
pub struct MainThreadHandle<T> {
    sender: Sender<Callback<T>>,
}

impl<T> Clone for MainThreadHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> MainThreadHandle<T> {
    /// Queues a callback for the main thread.
    ///
    /// Returns `false` if the queue was dropped.
    pub fn enqueue<F>(&self, callback: F) -> bool
    where
        F: FnOnce(&mut T) + Send + 'static,
    {
        if self.sender.send(Box::new(callback)).is_err() {
            warn!("main-thread queue closed, callback dropped");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::WorkerPool;

    #[test]
    fn test_drain_runs_in_order() {
        let queue = MainThreadQueue::<Vec<u32>>::new();
        let handle = queue.handle();
        for i in 0..5 {
            assert!(handle.enqueue(move |log: &mut Vec<u32>| log.push(i)));
        }

        let mut log = Vec::new();
        assert_eq!(queue.drain(&mut log), 5);
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_results_cross_from_workers() {
        let pool = WorkerPool::new(2).unwrap();
        let queue = MainThreadQueue::<u64>::new();

        for i in 1..=10u64 {
            let handle = queue.handle();
            pool.execute(move || {
                let value = i * i;
                handle.enqueue(move |total: &mut u64| *total += value);
            });
        }
        pool.wait_idle();

        let mut total = 0;
        queue.drain(&mut total);
        assert_eq!(total, 385);
    }

    #[test]
    fn test_enqueue_after_drop_reports_failure() {
        let queue = MainThreadQueue::<u32>::new();
        let handle = queue.handle();
        drop(queue);
        assert!(!handle.enqueue(|_| {}));
    }
}
