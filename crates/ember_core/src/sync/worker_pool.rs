//! Fixed-size pool of named worker threads.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Count of queued plus running jobs, with a wakeup for `wait_idle`.
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn increment(&self) {
        *self.count.lock() += 1;
    }

    fn decrement(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

/// Runs boxed jobs on a fixed number of OS threads.
///
/// Dropping the pool closes the job channel and joins every thread after
/// the queued jobs have run.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    pending: Arc<Pending>,
}

impl WorkerPool {
    /// Starts `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns the OS error if a thread cannot be spawned.
    pub fn new(threads: usize) -> std::io::Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let pending = Arc::new(Pending {
            count: Mutex::new(0),
            idle: Condvar::new(),
        });

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver: Receiver<Job> = receiver.clone();
            let pending = Arc::clone(&pending);
            let handle = std::thread::Builder::new()
                .name(format!("ember-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job));
                        if outcome.is_err() {
                            error!(worker = index, "background job panicked");
                        }
                        pending.decrement();
                    }
                })?;
            workers.push(handle);
        }

        debug!(threads, "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
            pending,
        })
    }

    /// Queues a job.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(sender) = &self.sender else {
            return;
        };
        self.pending.increment();
        if sender.send(Box::new(job)).is_err() {
            // Every worker has exited; nothing will run the job.
            self.pending.decrement();
            error!("worker pool has no running threads, job dropped");
        }
    }

    /// Number of jobs queued or running.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.pending.count.lock()
    }

    /// Blocks until every queued job has finished.
    pub fn wait_idle(&self) {
        let mut count = self.pending.count.lock();
        while *count > 0 {
            self.pending.idle.wait(&mut count);
        }
    }

    /// Number of worker threads.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel ends each worker's receive loop.
        self.sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
