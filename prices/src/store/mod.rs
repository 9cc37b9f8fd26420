pub mod sqlite_store;

use crate::model::{CatalogItem, ItemId, PriceObservation};

/// Append-only history of price observations.
#[async_trait::async_trait]
pub trait PriceStore: Send + Sync {
    async fn append(&self, observation: &PriceObservation) -> anyhow::Result<()>;

    /// All observations of `item_id` at or after `since_ms`, cheapest first.
    async fn query_range(
        &self,
        item_id: ItemId,
        since_ms: u64,
    ) -> anyhow::Result<Vec<PriceObservation>>;

    async fn most_recent(
        &self,
        item_id: ItemId,
        source: &str,
    ) -> anyhow::Result<Option<PriceObservation>>;

    /// Whether any observation of `item_id` came from one of `sources`.
    async fn has_any_from_sources(&self, item_id: ItemId, sources: &[&str])
    -> anyhow::Result<bool>;
}

/// Lookup and maintenance of catalog display records.
#[async_trait::async_trait]
pub trait ItemCatalog: Send + Sync {
    async fn find_item(&self, item_id: ItemId) -> anyhow::Result<Option<CatalogItem>>;

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<CatalogItem>>;

    /// Insert-or-update keyed by `item.id`.
    async fn upsert_item(&self, item: &CatalogItem) -> anyhow::Result<()>;
}
