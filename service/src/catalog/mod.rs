//! Storefront deal listings (CheapShark API).

pub mod client;
pub mod errors;
pub mod types;

use async_trait::async_trait;

pub use client::CatalogClient;
pub use errors::CatalogError;
pub use types::{CheapestPrice, GameDetail, Listing};

pub const DEFAULT_BASE_URL: &str = "https://www.cheapshark.com/api/1.0";

/// Source of current sale listings and one-off price history.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listings(&self) -> Result<Vec<Listing>, CatalogError>;

    async fn fetch_game(&self, game_id: &str) -> Result<GameDetail, CatalogError>;
}
