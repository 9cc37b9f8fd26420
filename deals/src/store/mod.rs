pub mod sqlite_store;

use prices::model::ItemId;

use crate::model::DealVerdict;

/// Latest verdict per item.
#[async_trait::async_trait]
pub trait DealStore: Send + Sync {
    async fn find_by_item(&self, item_id: ItemId) -> anyhow::Result<Option<DealVerdict>>;

    /// Insert-or-replace keyed by `verdict.item_id`, atomic per key.
    ///
    /// Returns the stored row; its `updated_at_ms` is strictly greater than that
    /// of any previous write for the same item.
    async fn upsert(&self, verdict: &DealVerdict) -> anyhow::Result<DealVerdict>;
}

/// Reverse index from item to subscriber endpoints.
#[async_trait::async_trait]
pub trait SubscriptionIndex: Send + Sync {
    async fn find_subscribers_by_item(&self, item_id: ItemId) -> anyhow::Result<Vec<String>>;
}
