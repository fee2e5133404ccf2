//! Application-level configuration.

use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "divrecon";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Evidence/critic rounds allowed per event before the pipeline concludes
/// with whatever evidence it has.
pub const DEFAULT_MAX_CRITIC_ITERATIONS: u32 = 5;

/// Events analyzed concurrently.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Wall-clock budget per event before it is marked failed.
pub const DEFAULT_EVENT_TIMEOUT_SECS: u64 = 600;

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}

/// Knobs for one reconciliation run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub max_critic_iterations: u32,
    pub parallelism: usize,
    pub event_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_critic_iterations: DEFAULT_MAX_CRITIC_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
            event_timeout: Duration::from_secs(DEFAULT_EVENT_TIMEOUT_SECS),
        }
    }
}
