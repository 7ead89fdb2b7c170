//! Progress reporting trait for the scrape and retry loops.
//!
//! Decouples progress reporting from any rendering backend. The binary
//! plugs in `indicatif` bars; tests and library callers use
//! [`NullProgress`].

/// Receives progress updates from a long-running loop.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work, when known up front (e.g. the
    /// number of failed pages to retry).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
