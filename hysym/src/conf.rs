#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default worker stack size, 16 MiB.
pub const DEFAULT_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Default number of nested join barriers before tree operations go sequential.
pub const DEFAULT_MAX_FORK_DEPTH: usize = 24;

/// Settings of the worker pool behind an [`Executor`](crate::flow::Executor).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SchedulerConfig {
    /// Number of worker threads; `0` lets `rayon` pick one per logical CPU.
    pub num_threads: usize,

    /// Worker threads are named `<prefix>-<index>`.
    pub thread_name_prefix: String,

    /// Stack size of each worker in bytes, `None` for the platform default.
    ///
    /// Below [`SchedulerConfig::max_fork_depth`] every operation recurses sequentially, so the
    /// deepest tree a worker handles is bounded by this size just as the caller's stack bounds
    /// the sequential forms. The default covers trees tens of thousands of levels deep.
    pub stack_size: Option<usize>,

    /// Number of nested join barriers after which tree operations stop forking and finish
    /// sequentially. `0` never forks.
    pub max_fork_depth: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_threads: 0,
            thread_name_prefix: "hysym-worker".to_string(),
            stack_size: Some(DEFAULT_STACK_SIZE),
            max_fork_depth: DEFAULT_MAX_FORK_DEPTH,
        }
    }
}

impl SchedulerConfig {
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    pub fn with_max_fork_depth(mut self, max_fork_depth: usize) -> Self {
        self.max_fork_depth = max_fork_depth;
        self
    }
}
