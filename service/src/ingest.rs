//! One ingest run: listings in, candidates scored.
//!
//! Per listing:
//!   1. Upsert the catalog item by name.
//!   2. Seed price history once (baseline and all-time low).
//!   3. Append the sale price unless it repeats the latest one.
//!   4. Evaluate eligibility.
//!
//! Candidates from the whole page are then scored in one `BatchScorer` run.

use std::sync::Arc;

use anyhow::Context;
use common::logger::{TraceId, child_span, root_span};
use common::time::{DAY_MS, now_ms};
use detector::{BatchScorer, Candidate, EligibilityFilter, RunReport};
use prices::model::{CatalogItem, ItemId, PriceObservation};
use prices::store::{ItemCatalog, PriceStore};
use tracing::{Instrument, Span, debug, field, info, warn};

use crate::catalog::{Listing, ListingSource};

pub const LIVE_SOURCE: &str = "Steam";
pub const BASELINE_SOURCE: &str = "Steam_Baseline";
pub const HISTORICAL_LOW_SOURCE: &str = "Steam_Historical_Low";

const SEED_SOURCES: [&str; 2] = [BASELINE_SOURCE, HISTORICAL_LOW_SOURCE];
const BASELINE_AGE_MS: u64 = 60 * DAY_MS;
const PLATFORM: &str = "PC";
const CURRENCY: &str = "USD";

pub struct Ingestor {
    source: Arc<dyn ListingSource>,
    prices: Arc<dyn PriceStore>,
    catalog: Arc<dyn ItemCatalog>,
    filter: EligibilityFilter,
    scorer: BatchScorer,
}

impl Ingestor {
    pub fn new(
        source: Arc<dyn ListingSource>,
        prices: Arc<dyn PriceStore>,
        catalog: Arc<dyn ItemCatalog>,
        filter: EligibilityFilter,
        scorer: BatchScorer,
    ) -> Self {
        Self {
            source,
            prices,
            catalog,
            filter,
            scorer,
        }
    }

    /// Fails only when the listing page itself cannot be fetched.
    pub async fn run_once(&self) -> anyhow::Result<RunReport> {
        let trace_id = TraceId::default();
        let span = root_span("ingest", &trace_id);

        async move {
            let listings = self
                .source
                .fetch_listings()
                .await
                .context("failed to fetch listings")?;

            let mut candidates: Vec<Candidate> = Vec::new();
            for listing in &listings {
                match self
                    .ingest_listing(listing)
                    .instrument(child_span("listing"))
                    .await
                {
                    Ok(Some(c)) => candidates.push(c),
                    Ok(None) => {}
                    Err(e) => warn!(title = %listing.title, error = %e, "listing skipped"),
                }
            }

            info!(
                listings = listings.len(),
                candidates = candidates.len(),
                "candidates collected"
            );

            Ok(self.scorer.process(&candidates).await)
        }
        .instrument(span)
        .await
    }

    async fn ingest_listing(&self, listing: &Listing) -> anyhow::Result<Option<Candidate>> {
        let sale_price = listing.sale_price()?;
        let item = self.upsert_item(listing).await?;
        Span::current().record("item_id", field::display(item.id));

        let now = now_ms();

        if !self.prices.has_any_from_sources(item.id, &SEED_SOURCES).await? {
            if let Err(e) = self.seed_history(&item, listing, now).await {
                warn!(title = %listing.title, error = %e, "history seeding failed");
            }
        }

        self.append_live(item.id, sale_price, now).await?;

        Ok(self.filter.evaluate(item.id, sale_price, now).await)
    }

    async fn upsert_item(&self, listing: &Listing) -> anyhow::Result<CatalogItem> {
        let existing = self.catalog.find_by_name(&listing.title).await?;

        let (item, changed) = match existing {
            None => {
                let mut item = CatalogItem::new(listing.title.clone(), PLATFORM);
                item.external_id = listing.app_id().map(str::to_string);
                item.image_url = listing.thumb().map(str::to_string);
                (item, true)
            }
            Some(mut item) => {
                let mut changed = false;
                if let Some(app) = listing.app_id() {
                    if item.external_id.as_deref() != Some(app) {
                        item.external_id = Some(app.to_string());
                        changed = true;
                    }
                }
                if let Some(thumb) = listing.thumb() {
                    if item.image_url.as_deref() != Some(thumb) {
                        item.image_url = Some(thumb.to_string());
                        changed = true;
                    }
                }
                (item, changed)
            }
        };

        if changed {
            self.catalog
                .upsert_item(&item)
                .await
                .with_context(|| format!("failed to upsert {}", item.name))?;
        }
        Ok(item)
    }

    async fn seed_history(
        &self,
        item: &CatalogItem,
        listing: &Listing,
        now: u64,
    ) -> anyhow::Result<()> {
        let detail = self.source.fetch_game(&listing.game_id).await?;

        let baseline = PriceObservation::new(
            item.id,
            listing.normal_price()?,
            CURRENCY,
            BASELINE_SOURCE,
            now.saturating_sub(BASELINE_AGE_MS),
        );
        self.prices.append(&baseline).await?;

        if let Some(low) = detail.cheapest_price_ever {
            let obs = PriceObservation::new(
                item.id,
                low.amount()?,
                CURRENCY,
                HISTORICAL_LOW_SOURCE,
                low.observed_at_ms(),
            );
            self.prices.append(&obs).await?;
        }

        debug!(name = %item.name, "price history seeded");
        Ok(())
    }

    async fn append_live(&self, item_id: ItemId, amount: f64, now: u64) -> anyhow::Result<()> {
        if let Some(prev) = self.prices.most_recent(item_id, LIVE_SOURCE).await? {
            if prev.amount == amount {
                debug!(amount, "price unchanged, not appended");
                return Ok(());
            }
        }

        self.prices
            .append(&PriceObservation::new(
                item_id,
                amount,
                CURRENCY,
                LIVE_SOURCE,
                now,
            ))
            .await
    }
}
