//! Which stored scores count as provisional.
//!
//! A verdict carrying a provisional score does not hold the cooldown: the item
//! is analysed again on the next run even if the verdict is recent.

use deals::model::Score;

/// Score written when the oracle could not be reached.
pub const FALLBACK_SCORE: f64 = 75.0;

/// Non-committal score the oracle uses for "cannot tell".
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Rationale stored alongside [`FALLBACK_SCORE`].
pub const FALLBACK_RATIONALE: &str = "Scoring temporarily unavailable (rate limited)";

#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionalScores {
    scores: Vec<f64>,
}

impl ProvisionalScores {
    pub fn new<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut scores: Vec<f64> = scores.into_iter().filter(|s| s.is_finite()).collect();
        scores.sort_by(f64::total_cmp);
        scores.dedup();
        Self { scores }
    }

    /// Exact match; scores are stored as written.
    pub fn contains(&self, score: Score) -> bool {
        self.scores.iter().any(|s| *s == score.value())
    }

    /// Fallback verdicts are only retried while this holds.
    pub fn includes_fallback(&self) -> bool {
        self.scores.contains(&FALLBACK_SCORE)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.scores
    }
}

impl Default for ProvisionalScores {
    fn default() -> Self {
        Self::new([NEUTRAL_SCORE, FALLBACK_SCORE])
    }
}
