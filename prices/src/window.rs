//! Statistics over the trailing analysis window of an item's prices.
//
//  Pure arithmetic: no async, no IO.

use crate::model::PriceObservation;

/// Summary of the observations inside the analysis window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceWindow {
    pub samples: usize,
    pub average: f64,
    pub historical_low: f64,
}

impl PriceWindow {
    /// Builds the summary from raw amounts. `None` for an empty window.
    pub fn from_amounts<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut samples = 0usize;
        let mut sum = 0.0;
        let mut low = f64::INFINITY;

        for a in amounts {
            samples += 1;
            sum += a;
            low = low.min(a);
        }

        if samples == 0 {
            return None;
        }

        Some(Self {
            samples,
            average: sum / samples as f64,
            historical_low: low,
        })
    }

    pub fn from_observations(observations: &[PriceObservation]) -> Option<Self> {
        Self::from_amounts(observations.iter().map(|o| o.amount))
    }

    /// Discount of `current` relative to the window average, in percent.
    pub fn discount_rate(&self, current: f64) -> Option<f64> {
        discount_rate(self.average, current)
    }
}

/// `(reference - current) / reference * 100`; `None` when the reference is not
/// a positive finite price.
///
/// Multiplies before dividing so whole-percent boundaries (e.g. 20 → 6 is
/// exactly 70%) are not lost to rounding.
pub fn discount_rate(reference: f64, current: f64) -> Option<f64> {
    if !reference.is_finite() || reference <= 0.0 || !current.is_finite() {
        return None;
    }
    Some((reference - current) * 100.0 / reference)
}

/// Discount rate for display: rounded to the nearest integer, ties away from zero.
pub fn display_discount_rate(old_price: f64, new_price: f64) -> Option<i64> {
    discount_rate(old_price, new_price).map(|r| r.round() as i64)
}
