//! Dispatch configuration

/// Options for [`Dispatcher`](crate::Dispatcher)
#[derive(Clone, Debug)]
pub struct ExecConfig {
    /// Fan workers out across threads (requires the `parallel` feature)
    pub enable_parallel: bool,
    /// Minimum used workers before going parallel (0 = always parallel when enabled)
    pub min_workers_for_parallel: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            enable_parallel: true,
            min_workers_for_parallel: 2,
        }
    }
}

impl ExecConfig {
    /// Create new dispatch options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every worker on the calling thread
    pub fn sequential() -> Self {
        Self {
            enable_parallel: false,
            ..Self::default()
        }
    }

    /// Enable or disable parallel fan-out
    pub fn enable_parallel(mut self, enable: bool) -> Self {
        self.enable_parallel = enable;
        self
    }

    /// Set the adaptive parallel threshold
    pub fn min_workers_for_parallel(mut self, workers: usize) -> Self {
        self.min_workers_for_parallel = workers;
        self
    }

    /// Whether `used_workers` workers should run in parallel
    pub fn should_use_parallel(&self, used_workers: usize) -> bool {
        cfg!(feature = "parallel")
            && self.enable_parallel
            && used_workers >= self.min_workers_for_parallel
    }
}
