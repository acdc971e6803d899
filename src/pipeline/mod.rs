//! Stage runners
//!
//! Each stage is an embarrassingly parallel map over independent tasks:
//! - Stage A ([`run_transform_stage`]): one task per `(split, id)`
//! - Stage B ([`run_concat_stage`]): one task per `(split, kind)`
//!
//! Tasks share no mutable state and write disjoint files, so the only
//! coordination is the pool itself. Every stage runs in its own
//! fixed-size [`rayon::ThreadPool`] sized by
//! [`PipelineConfig::num_threads`](crate::config::PipelineConfig::num_threads).

mod concat;
mod transform;

pub use concat::{concatenate_split, run_concat_stage, ConcatSummary};
pub use transform::{produce_derived_tables, run_transform_stage, TransformSummary};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{Error, Result};

/// Build a named worker pool for one stage
///
/// # Errors
/// Returns [`Error::ThreadPool`] if the OS refuses to spawn workers
pub fn worker_pool(stage: &'static str, num_threads: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(move |i| format!("{stage}-worker-{i}"))
        .build()
        .map_err(|e| Error::ThreadPool(format!("{stage}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_pool_size_and_names() {
        let pool = worker_pool("transform", 2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);

        let name = pool.install(|| std::thread::current().name().map(str::to_string));
        assert!(name.unwrap().starts_with("transform-worker-"));
    }
}
