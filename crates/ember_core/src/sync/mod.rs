//! # Background Work and Main-Thread Handoff
//!
//! ECS storage is only ever touched from the main thread. Work that can
//! run elsewhere (terrain generation, asset preparation) goes to a
//! [`WorkerPool`], and its results come back through a
//! [`MainThreadQueue`] that the scene drains at a fixed point in the frame.
//!
//! ```text
//! Main thread                      Worker threads
//!   spawn job ───────────────────▶   job()
//!                                     │
//!   queue.drain(&mut scene) ◀──────  handle.enqueue(|scene| ...)
//! ```

mod main_thread;
mod worker_pool;

pub use main_thread::{MainThreadHandle, MainThreadQueue};
pub use worker_pool::WorkerPool;
