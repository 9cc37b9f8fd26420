//! Per-run counters.

use std::fmt;

/// Outcome of one [`crate::BatchScorer::process`] call. Informational only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub candidates: usize,
    pub chunks: usize,
    pub oracle_calls: usize,
    pub oracle_failures: usize,
    pub verdicts_written: usize,
    pub write_failures: usize,
    pub fallback_verdicts: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
    /// Chunks left unprocessed because shutdown was requested.
    pub chunks_skipped: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "candidates={} chunks={} oracle_calls={} oracle_failures={} verdicts={} \
             fallbacks={} write_failures={} notified={} notify_failures={} skipped_chunks={}",
            self.candidates,
            self.chunks,
            self.oracle_calls,
            self.oracle_failures,
            self.verdicts_written,
            self.fallback_verdicts,
            self.write_failures,
            self.notifications_sent,
            self.notifications_failed,
            self.chunks_skipped,
        )
    }
}
