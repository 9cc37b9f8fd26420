use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use prices::model::ItemId;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("score {0} outside [0, 100]")]
    OutOfRange(f64),
}

/// Realism score of a discount, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Result<Self, ScoreError> {
        // NaN fails both comparisons
        if (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoreError::OutOfRange(value))
        }
    }

    /// Clamps into range; NaN maps to `MIN_SCORE`.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(MIN_SCORE);
        }
        Self(value.clamp(MIN_SCORE, MAX_SCORE))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(s: Score) -> Self {
        s.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Latest scoring outcome for an item. Exactly one exists per `item_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealVerdict {
    pub item_id: ItemId,

    /// Window average the discount was measured against.
    pub old_price: f64,
    pub new_price: f64,

    pub score: Score,
    pub rationale: String,

    /// Set by the writer; the store bumps it when it would not advance.
    pub updated_at_ms: u64,
}

impl DealVerdict {
    pub fn new(
        item_id: ItemId,
        old_price: f64,
        new_price: f64,
        score: Score,
        rationale: impl Into<String>,
        updated_at_ms: u64,
    ) -> Self {
        Self {
            item_id,
            old_price,
            new_price,
            score,
            rationale: rationale.into(),
            updated_at_ms,
        }
    }

    /// Whether the verdict was written within `window_ms` of `now_ms` (inclusive).
    pub fn is_fresh(&self, now_ms: u64, window_ms: u64) -> bool {
        now_ms.saturating_sub(self.updated_at_ms) <= window_ms
    }
}

/// A subscriber endpoint (e.g. a chat id) and the items it follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub endpoint: String,
    pub item_ids: BTreeSet<ItemId>,
    pub updated_at_ms: u64,
}
