//! SQLite-backed deal verdicts and subscriptions.
//!
//!  - `deals`              : one row per item, written with ON CONFLICT upsert
//!  - `subscriptions`      : one row per endpoint
//!  - `subscription_items` : (endpoint, item) pairs, indexed by item for fanout
use std::collections::BTreeSet;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use prices::model::ItemId;

use super::{DealStore, SubscriptionIndex};
use crate::model::{DealVerdict, Score, Subscription};

pub struct SQLiteDealStore {
    pool: SqlitePool,
}

impl SQLiteDealStore {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS deals (
                item_id TEXT PRIMARY KEY,
                old_price REAL NOT NULL,
                new_price REAL NOT NULL,
                score REAL NOT NULL CHECK (score >= 0 AND score <= 100),
                rationale TEXT NOT NULL,
                updated_at_ms INTEGER NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                endpoint TEXT PRIMARY KEY,
                updated_at_ms INTEGER NOT NULL
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscription_items (
                endpoint TEXT NOT NULL,
                item_id TEXT NOT NULL,
                PRIMARY KEY (endpoint, item_id)
            );
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE INDEX IF NOT EXISTS idx_subscription_items_item ON subscription_items(item_id);"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Creates the subscription for `sub.endpoint`, or replaces its item set.
    pub async fn replace_subscription(&self, sub: &Subscription) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (endpoint, updated_at_ms)
            VALUES (?, ?)
            ON CONFLICT(endpoint) DO UPDATE SET updated_at_ms = excluded.updated_at_ms;
        "#,
        )
        .bind(&sub.endpoint)
        .bind(ms_to_i64(sub.updated_at_ms)?)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM subscription_items WHERE endpoint = ?")
            .bind(&sub.endpoint)
            .execute(&mut *tx)
            .await?;

        for item_id in &sub.item_ids {
            sqlx::query("INSERT INTO subscription_items (endpoint, item_id) VALUES (?, ?)")
                .bind(&sub.endpoint)
                .bind(item_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            endpoint = %sub.endpoint,
            items = sub.item_ids.len(),
            "subscription stored"
        );

        Ok(())
    }

    pub async fn find_by_endpoint(&self, endpoint: &str) -> anyhow::Result<Option<Subscription>> {
        let row = sqlx::query("SELECT endpoint, updated_at_ms FROM subscriptions WHERE endpoint = ?")
            .bind(endpoint)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let rows = sqlx::query("SELECT item_id FROM subscription_items WHERE endpoint = ?")
            .bind(endpoint)
            .fetch_all(&self.pool)
            .await?;

        let mut item_ids = BTreeSet::new();
        for r in rows {
            let id_str: String = r.get("item_id");
            item_ids.insert(ItemId::parse_str(&id_str).context("invalid subscription item_id")?);
        }

        let updated_at_ms: i64 = row.get("updated_at_ms");

        Ok(Some(Subscription {
            endpoint: row.get("endpoint"),
            item_ids,
            updated_at_ms: updated_at_ms.max(0) as u64,
        }))
    }
}

#[async_trait]
impl DealStore for SQLiteDealStore {
    async fn find_by_item(&self, item_id: ItemId) -> anyhow::Result<Option<DealVerdict>> {
        let row = sqlx::query(
            r#"
            SELECT item_id, old_price, new_price, score, rationale, updated_at_ms
            FROM deals
            WHERE item_id = ?;
        "#,
        )
        .bind(item_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_verdict).transpose()
    }

    async fn upsert(&self, verdict: &DealVerdict) -> anyhow::Result<DealVerdict> {
        // updated_at_ms never moves backwards or stalls for the same key,
        // even when two writes share a millisecond.
        let row = sqlx::query(
            r#"
            INSERT INTO deals (item_id, old_price, new_price, score, rationale, updated_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(item_id) DO UPDATE SET
                old_price = excluded.old_price,
                new_price = excluded.new_price,
                score = excluded.score,
                rationale = excluded.rationale,
                updated_at_ms = MAX(excluded.updated_at_ms, deals.updated_at_ms + 1)
            RETURNING item_id, old_price, new_price, score, rationale, updated_at_ms;
        "#,
        )
        .bind(verdict.item_id.to_string())
        .bind(verdict.old_price)
        .bind(verdict.new_price)
        .bind(verdict.score.value())
        .bind(&verdict.rationale)
        .bind(ms_to_i64(verdict.updated_at_ms)?)
        .fetch_one(&self.pool)
        .await?;

        row_to_verdict(&row)
    }
}

#[async_trait]
impl SubscriptionIndex for SQLiteDealStore {
    async fn find_subscribers_by_item(&self, item_id: ItemId) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT endpoint FROM subscription_items
            WHERE item_id = ?
            ORDER BY endpoint ASC;
        "#,
        )
        .bind(item_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get::<String, _>("endpoint")).collect())
    }
}

fn row_to_verdict(row: &SqliteRow) -> anyhow::Result<DealVerdict> {
    let id_str: String = row.get("item_id");
    let item_id = ItemId::parse_str(&id_str).context("invalid deal item_id")?;
    let score = Score::new(row.get::<f64, _>("score")).context("corrupt deal score")?;
    let updated_at_ms: i64 = row.get("updated_at_ms");

    Ok(DealVerdict {
        item_id,
        old_price: row.get("old_price"),
        new_price: row.get("new_price"),
        score,
        rationale: row.get("rationale"),
        updated_at_ms: updated_at_ms.max(0) as u64,
    })
}

fn ms_to_i64(v: u64) -> anyhow::Result<i64> {
    i64::try_from(v).map_err(|_| anyhow::anyhow!("timestamp too large for i64: {v}"))
}
