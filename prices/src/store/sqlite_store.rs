//! SQLite-backed price history and catalog.
//!
//! Owns two tables:
//!
//!  - `games`  : one display record per item, unique by name
//!  - `prices` : append-only observations, indexed by (item, time)
use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use super::{ItemCatalog, PriceStore};
use crate::model::{CatalogItem, ItemId, PriceObservation};

pub struct SQLitePriceStore {
    pool: SqlitePool,
}

impl SQLitePriceStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                platform TEXT NOT NULL,
                external_id TEXT,
                image_url TEXT
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id TEXT NOT NULL,
                amount REAL NOT NULL,
                currency TEXT NOT NULL,
                source TEXT NOT NULL,
                observed_at_ms INTEGER NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE INDEX IF NOT EXISTS idx_prices_item_time ON prices(item_id, observed_at_ms);"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PriceStore for SQLitePriceStore {
    async fn append(&self, observation: &PriceObservation) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO prices (item_id, amount, currency, source, observed_at_ms)
            VALUES (?, ?, ?, ?, ?);
        "#,
        )
        .bind(observation.item_id.to_string())
        .bind(observation.amount)
        .bind(&observation.currency)
        .bind(&observation.source)
        .bind(ms_to_i64(observation.observed_at_ms)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_range(
        &self,
        item_id: ItemId,
        since_ms: u64,
    ) -> anyhow::Result<Vec<PriceObservation>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, amount, currency, source, observed_at_ms
            FROM prices
            WHERE item_id = ? AND observed_at_ms >= ?
            ORDER BY amount ASC, observed_at_ms ASC;
        "#,
        )
        .bind(item_id.to_string())
        .bind(ms_to_i64(since_ms)?)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_observation).collect()
    }

    async fn most_recent(
        &self,
        item_id: ItemId,
        source: &str,
    ) -> anyhow::Result<Option<PriceObservation>> {
        let row = sqlx::query(
            r#"
            SELECT item_id, amount, currency, source, observed_at_ms
            FROM prices
            WHERE item_id = ? AND source = ?
            ORDER BY observed_at_ms DESC, id DESC
            LIMIT 1;
        "#,
        )
        .bind(item_id.to_string())
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_observation).transpose()
    }

    async fn has_any_from_sources(
        &self,
        item_id: ItemId,
        sources: &[&str],
    ) -> anyhow::Result<bool> {
        if sources.is_empty() {
            return Ok(false);
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT 1 FROM prices WHERE item_id = ");
        qb.push_bind(item_id.to_string());
        qb.push(" AND source IN (");
        let mut sep = qb.separated(", ");
        for s in sources {
            sep.push_bind(*s);
        }
        sep.push_unseparated(") LIMIT 1");

        let row = qb.build().fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl ItemCatalog for SQLitePriceStore {
    async fn find_item(&self, item_id: ItemId) -> anyhow::Result<Option<CatalogItem>> {
        let row = sqlx::query(
            "SELECT id, name, platform, external_id, image_url FROM games WHERE id = ?",
        )
        .bind(item_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<CatalogItem>> {
        let row = sqlx::query(
            "SELECT id, name, platform, external_id, image_url FROM games WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn upsert_item(&self, item: &CatalogItem) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO games (id, name, platform, external_id, image_url)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                platform = excluded.platform,
                external_id = excluded.external_id,
                image_url = excluded.image_url;
        "#,
        )
        .bind(item.id.to_string())
        .bind(&item.name)
        .bind(&item.platform)
        .bind(&item.external_id)
        .bind(&item.image_url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_observation(row: &SqliteRow) -> anyhow::Result<PriceObservation> {
    let id_str: String = row.get("item_id");
    let item_id = ItemId::parse_str(&id_str).context("invalid item_id")?;
    let observed_at_ms: i64 = row.get("observed_at_ms");

    Ok(PriceObservation {
        item_id,
        amount: row.get("amount"),
        currency: row.get("currency"),
        source: row.get("source"),
        observed_at_ms: observed_at_ms.max(0) as u64,
    })
}

fn row_to_item(row: &SqliteRow) -> anyhow::Result<CatalogItem> {
    let id_str: String = row.get("id");

    Ok(CatalogItem {
        id: ItemId::parse_str(&id_str).context("invalid game id")?,
        name: row.get("name"),
        platform: row.get("platform"),
        external_id: row.get("external_id"),
        image_url: row.get("image_url"),
    })
}

fn ms_to_i64(v: u64) -> anyhow::Result<i64> {
    i64::try_from(v).map_err(|_| anyhow::anyhow!("timestamp too large for i64: {v}"))
}
