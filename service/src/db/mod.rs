use std::str::FromStr;

use deals::store::sqlite_store::SQLiteDealStore;
use prices::store::sqlite_store::SQLitePriceStore;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }

    /// Every store owns its DDL; this runs all of them.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        SQLitePriceStore::from_pool(self.pool.clone())
            .migrate()
            .await?;
        SQLiteDealStore::from_pool(self.pool.clone()).migrate().await
    }

    pub fn price_store(&self) -> SQLitePriceStore {
        SQLitePriceStore::from_pool(self.pool.clone())
    }

    pub fn deal_store(&self) -> SQLiteDealStore {
        SQLiteDealStore::from_pool(self.pool.clone())
    }
}
