use async_trait::async_trait;

use crate::types::{OracleError, OracleScore, ScoreRequest};

/// Batch judgment service assigning a realism score to each discount.
///
/// Implementations return only schema-valid output: one entry per requested
/// identifier with a score in `[0, 100]`. Anything else is an error and the
/// whole batch is treated as failed.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    async fn score_batch(&self, batch: &[ScoreRequest]) -> Result<Vec<OracleScore>, OracleError>;
}
