use std::sync::OnceLock;

use crate::env::env_number;

/// A wrapper around the Rayon thread pool used for batch resolution.
pub struct ThreadPool {
    /// The wrapped thread pool, or None if we failed to construct one.
    pool: Option<rayon::ThreadPool>,
}

impl ThreadPool {
    /// Run a function in the thread pool.
    ///
    /// This corresponds to [`rayon::ThreadPool::install`]. If the pool could
    /// not be created, `op` runs on the calling thread.
    pub fn run<R: Send, Op: FnOnce() -> R + Send>(&self, op: Op) -> R {
        if let Some(pool) = self.pool.as_ref() {
            pool.install(op)
        } else {
            op()
        }
    }

    /// Create a thread pool with a given number of threads.
    pub fn with_num_threads(num_threads: usize) -> ThreadPool {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("arpa-{}", index))
            .build();

        if let Err(err) = &pool {
            tracing::warn!(%err, "failed to create thread pool, running on caller thread");
        }

        ThreadPool { pool: pool.ok() }
    }

    /// Return the number of threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }
}

/// Resolve the thread count from an optional override, clamped to the
/// logical core count, falling back to the physical core count.
fn num_threads(requested: Option<usize>) -> usize {
    let physical = num_cpus::get_physical().max(1);
    match requested {
        Some(n) => n.clamp(1, num_cpus::get().max(1)),
        None => physical,
    }
}

/// Return the thread pool used by [`BatchResolver`](crate::BatchResolver) to
/// partition lines.
///
/// The thread count defaults to the number of physical cores. It can be
/// overridden by setting the `ARPA_NUM_THREADS` environment variable to a
/// number between 1 and the logical core count.
pub fn thread_pool() -> &'static ThreadPool {
    static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();
    THREAD_POOL.get_or_init(|| {
        let threads = num_threads(env_number("ARPA_NUM_THREADS"));
        tracing::debug!(threads, "creating thread pool");
        ThreadPool::with_num_threads(threads)
    })
}
