//! Decides whether a freshly observed price is worth scoring.
//
//  Read-only: consults price history, the latest verdict and the catalog,
//  never writes.

use std::sync::Arc;
use std::time::Duration;

use common::logger::warn_if_slow;
use deals::store::DealStore;
use prices::model::ItemId;
use prices::store::{ItemCatalog, PriceStore};
use prices::window::PriceWindow;
use tracing::{debug, instrument, warn};

use crate::types::{Candidate, DetectorConfig};

const SLOW_LOOKUP: Duration = Duration::from_millis(250);

/// Result of an eligibility check.
#[derive(Debug, Clone, PartialEq)]
pub enum Eligibility {
    Candidate(Candidate),
    /// A recent, non-provisional verdict exists.
    CooldownActive,
    InsufficientData,
    BelowThreshold,
    /// A store call failed or the item is missing from the catalog.
    LookupFailed,
}

impl Eligibility {
    pub fn is_candidate(&self) -> bool {
        matches!(self, Eligibility::Candidate(_))
    }

    pub fn into_candidate(self) -> Option<Candidate> {
        match self {
            Eligibility::Candidate(c) => Some(c),
            _ => None,
        }
    }
}

pub struct EligibilityFilter {
    prices: Arc<dyn PriceStore>,
    deals: Arc<dyn DealStore>,
    catalog: Arc<dyn ItemCatalog>,
    cfg: DetectorConfig,
}

impl EligibilityFilter {
    pub fn new(
        prices: Arc<dyn PriceStore>,
        deals: Arc<dyn DealStore>,
        catalog: Arc<dyn ItemCatalog>,
        cfg: DetectorConfig,
    ) -> Self {
        if !cfg.provisional.includes_fallback() {
            warn!(
                provisional = ?cfg.provisional.as_slice(),
                "fallback score is not provisional; fallback verdicts will hold the cooldown"
            );
        }
        Self {
            prices,
            deals,
            catalog,
            cfg,
        }
    }

    /// Candidate for `item_id` at `current_price`, if any.
    pub async fn evaluate(
        &self,
        item_id: ItemId,
        current_price: f64,
        now_ms: u64,
    ) -> Option<Candidate> {
        self.check(item_id, current_price, now_ms)
            .await
            .into_candidate()
    }

    /// Same as [`Self::evaluate`] but keeps the rejection reason.
    ///
    /// Order: cooldown, history size, discount, name lookup. Store errors end
    /// the check with [`Eligibility::LookupFailed`].
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn check(&self, item_id: ItemId, current_price: f64, now_ms: u64) -> Eligibility {
        match self.deals.find_by_item(item_id).await {
            Ok(Some(verdict))
                if verdict.is_fresh(now_ms, self.cfg.cooldown_ms)
                    && !self.cfg.provisional.contains(verdict.score) =>
            {
                debug!(score = %verdict.score, "analysed recently, skipping");
                return Eligibility::CooldownActive;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "verdict lookup failed");
                return Eligibility::LookupFailed;
            }
        }

        let since_ms = now_ms.saturating_sub(self.cfg.window_ms);
        let history = match warn_if_slow(
            "price_history",
            SLOW_LOOKUP,
            self.prices.query_range(item_id, since_ms),
        )
        .await
        {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "price history lookup failed");
                return Eligibility::LookupFailed;
            }
        };

        if history.len() < self.cfg.min_observations {
            debug!(samples = history.len(), "not enough history");
            return Eligibility::InsufficientData;
        }

        let Some(window) = PriceWindow::from_observations(&history) else {
            return Eligibility::InsufficientData;
        };

        let rate = window.discount_rate(current_price);
        if !rate.is_some_and(|r| r >= self.cfg.discount_threshold_pct) {
            debug!(average = window.average, current_price, ?rate, "discount below threshold");
            return Eligibility::BelowThreshold;
        }

        let item = match self.catalog.find_item(item_id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                warn!("item missing from catalog");
                return Eligibility::LookupFailed;
            }
            Err(e) => {
                warn!(error = %e, "catalog lookup failed");
                return Eligibility::LookupFailed;
            }
        };

        debug!(
            name = %item.name,
            discount = rate.unwrap_or_default().round(),
            "candidate found"
        );

        Eligibility::Candidate(Candidate {
            item_id,
            item_name: item.name,
            current_price,
            average_price: window.average,
            historical_low: window.historical_low,
        })
    }
}
