// Runtime module
// The tokio multi-thread runtime is the reactor and the worker pool

use std::num::NonZeroUsize;
use tokio::runtime::{Builder, Runtime};

/// Worker threads for a machine with `parallelism` hardware threads:
/// half of them, never fewer than one
pub const fn worker_count_for(parallelism: usize) -> usize {
    let half = parallelism / 2;
    if half == 0 {
        1
    } else {
        half
    }
}

/// Worker count for this machine; unknown parallelism counts as one
pub fn default_worker_count() -> usize {
    let parallelism = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
    worker_count_for(parallelism)
}

/// Build the runtime with `workers` worker threads, timers and I/O enabled
pub fn build_runtime(workers: usize) -> std::io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(workers.max(1))
        .thread_name("treeserve-worker")
        .enable_all()
        .build()
}
