use serde::{Deserialize, Serialize};
use url::Url;

const STORE_BASE_URL: &str = "https://store.steampowered.com";

pub type ItemId = uuid::Uuid;

/// One price seen for an item at a point in time. Never mutated after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub item_id: ItemId,
    pub amount: f64,
    pub currency: String,
    /// Where the price came from, e.g. `Steam` or a seeded history marker.
    pub source: String,
    pub observed_at_ms: u64,
}

impl PriceObservation {
    pub fn new(
        item_id: ItemId,
        amount: f64,
        currency: impl Into<String>,
        source: impl Into<String>,
        observed_at_ms: u64,
    ) -> Self {
        Self {
            item_id,
            amount,
            currency: currency.into(),
            source: source.into(),
            observed_at_ms,
        }
    }
}

/// Display record of a catalog item ("game").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub platform: String,

    /// Storefront application id, when the listing carried one.
    pub external_id: Option<String>,
    pub image_url: Option<String>,
}

impl CatalogItem {
    pub fn new(name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            id: ItemId::new_v4(),
            name: name.into(),
            platform: platform.into(),
            external_id: None,
            image_url: None,
        }
    }

    /// Storefront header image, only available with an external id.
    pub fn header_image_url(&self) -> Option<String> {
        self.external_id
            .as_deref()
            .map(|app| format!("https://cdn.akamai.steamstatic.com/steam/apps/{app}/header.jpg"))
    }

    /// Store page when the external id is known, otherwise a store search by name.
    pub fn store_link(&self) -> Option<String> {
        let url = match self.external_id.as_deref() {
            Some(app) => Url::parse(&format!("{STORE_BASE_URL}/app/{app}")),
            None => Url::parse_with_params(
                &format!("{STORE_BASE_URL}/search/"),
                &[("term", &self.name)],
            ),
        };
        url.ok().map(String::from)
    }
}
