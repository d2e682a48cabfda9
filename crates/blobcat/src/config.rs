//! Fetch configuration.

use std::time::Duration;

use blobcat_store::LOCK_CONTENTION_MARKER;

/// Configuration for range fetches.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Retries allowed after the first read attempt of one fetch.
    pub max_retries: u32,
    /// Pause before each retry.
    pub retry_backoff: Duration,
    /// Stderr substring that marks a read failure as lock contention.
    pub lock_marker: String,
    /// Largest chunk handed to the reader at once.
    pub chunk_size: usize,
    /// How long to wait for a failed read's stderr to be fully captured.
    pub stderr_grace: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 100,
            retry_backoff: Duration::from_secs(1),
            lock_marker: LOCK_CONTENTION_MARKER.to_string(),
            chunk_size: 64 * 1024,
            stderr_grace: Duration::from_secs(1),
        }
    }
}
