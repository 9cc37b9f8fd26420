//! Shared types used by the detector.

use std::time::Duration;

use common::time::{DAY_MS, HOUR_MS};
use deals::model::Score;
use oracle::ScoreRequest;
use prices::model::ItemId;

use crate::policy::{FALLBACK_RATIONALE, FALLBACK_SCORE, ProvisionalScores};

/// An item whose current price passed every filter and awaits scoring.
///
/// Lives for one run only; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item_id: ItemId,
    pub item_name: String,
    pub current_price: f64,
    pub average_price: f64,
    pub historical_low: f64,
}

impl Candidate {
    pub fn to_request(&self) -> ScoreRequest {
        ScoreRequest {
            identifier: self.item_id.to_string(),
            name: self.item_name.clone(),
            current_price: self.current_price,
            average_price: self.average_price,
            historical_low: self.historical_low,
        }
    }
}

/// Knobs for [`crate::EligibilityFilter`].
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// A non-provisional verdict younger than this (inclusive) blocks re-analysis.
    pub cooldown_ms: u64,

    /// Trailing window of price history considered.
    pub window_ms: u64,

    /// Minimum discount, in percent, against the window average (inclusive).
    pub discount_threshold_pct: f64,

    pub min_observations: usize,

    pub provisional: ProvisionalScores,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 24 * HOUR_MS,
            window_ms: 90 * DAY_MS,
            discount_threshold_pct: 70.0,
            min_observations: 2,
            provisional: ProvisionalScores::default(),
        }
    }
}

/// Knobs for [`crate::BatchScorer`].
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub chunk_size: usize,

    /// Pause between two consecutive oracle calls. Never applied after the last chunk.
    pub inter_chunk_delay: Duration,

    /// Upper bound on a single oracle call.
    pub oracle_timeout: Duration,

    /// Scores at or above this are announced.
    pub notify_threshold: f64,

    pub fallback_score: Score,
    pub fallback_rationale: String,

    /// Operator channel that also receives every announced deal.
    pub broadcast_endpoint: Option<String>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3,
            inter_chunk_delay: Duration::from_secs(15),
            oracle_timeout: Duration::from_secs(30),
            notify_threshold: 90.0,
            fallback_score: Score::clamped(FALLBACK_SCORE),
            fallback_rationale: FALLBACK_RATIONALE.to_string(),
            broadcast_endpoint: None,
        }
    }
}
