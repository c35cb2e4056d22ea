use std::time::Duration;

/// Pacing for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Destinations processed concurrently per group.
    pub group_size: usize,
    /// Pause between groups.
    pub group_pause: Duration,
    /// Pause between add-tracks batches for one subscription.
    pub batch_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            group_size: 3,
            group_pause: Duration::from_millis(1000),
            batch_delay: Duration::from_millis(100),
        }
    }
}
