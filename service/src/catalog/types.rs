use serde::Deserialize;

use super::CatalogError;

/// One entry of `/deals`. Prices arrive as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub title: String,

    #[serde(rename = "gameID")]
    pub game_id: String,

    #[serde(rename = "steamAppID", default)]
    pub steam_app_id: Option<String>,

    #[serde(default)]
    pub thumb: Option<String>,

    pub sale_price: String,
    pub normal_price: String,
}

impl Listing {
    pub fn sale_price(&self) -> Result<f64, CatalogError> {
        parse_price(&self.sale_price)
    }

    pub fn normal_price(&self) -> Result<f64, CatalogError> {
        parse_price(&self.normal_price)
    }

    pub fn app_id(&self) -> Option<&str> {
        self.steam_app_id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn thumb(&self) -> Option<&str> {
        self.thumb.as_deref().filter(|s| !s.is_empty())
    }
}

/// `/games?id=` response, trimmed to what history seeding reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDetail {
    #[serde(default)]
    pub cheapest_price_ever: Option<CheapestPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheapestPrice {
    pub price: String,

    /// Unix seconds.
    pub date: u64,
}

impl CheapestPrice {
    pub fn amount(&self) -> Result<f64, CatalogError> {
        parse_price(&self.price)
    }

    pub fn observed_at_ms(&self) -> u64 {
        self.date.saturating_mul(1_000)
    }
}

fn parse_price(raw: &str) -> Result<f64, CatalogError> {
    let v: f64 = raw.trim().parse()?;
    if !v.is_finite() || v < 0.0 {
        return Err(CatalogError::InvalidResponse(format!("price {raw:?}")));
    }
    Ok(v)
}
