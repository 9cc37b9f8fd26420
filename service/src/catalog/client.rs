use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::errors::CatalogError;
use super::types::{GameDetail, Listing};
use super::ListingSource;

#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    url: String,
    store_id: u32,
    page_size: u32,
}

impl CatalogClient {
    pub fn new(url: String, store_id: u32, page_size: u32) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            store_id,
            page_size,
        })
    }
}

#[async_trait]
impl ListingSource for CatalogClient {
    #[instrument(skip(self), fields(store_id = self.store_id), level = "debug")]
    async fn fetch_listings(&self) -> Result<Vec<Listing>, CatalogError> {
        let url = format!(
            "{}/deals?storeID={}&pageSize={}",
            self.url, self.store_id, self.page_size
        );

        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let listings: Vec<Listing> = resp.json().await?;

        debug!(count = listings.len(), "listings fetched");
        Ok(listings)
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_game(&self, game_id: &str) -> Result<GameDetail, CatalogError> {
        let url = format!("{}/games", self.url);

        let resp = self
            .http
            .get(&url)
            .query(&[("id", game_id)])
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json().await?)
    }
}
