//! Wiring of stores, clients and the pipeline.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, bail};
use common::time::now_ms;
use deals::model::Subscription;
use deals::store::sqlite_store::SQLiteDealStore;
use detector::{BatchScorer, EligibilityFilter};
use notifier::format::render_test_message;
use notifier::{DealNotifier, DisabledSink, NotificationSink, TelegramSink};
use oracle::ScoringOracle;
use oracle::gemini::GeminiOracle;
use prices::model::{CatalogItem, ItemId};
use prices::store::ItemCatalog;
use prices::store::sqlite_store::SQLitePriceStore;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use crate::catalog::CatalogClient;
use crate::config::AppConfig;
use crate::db::Db;
use crate::error::AppError;
use crate::ingest::Ingestor;

pub async fn init_db(cfg: &AppConfig) -> anyhow::Result<Db> {
    let db = Db::connect(&cfg.database_url).await?;
    db.migrate().await?;
    Ok(db)
}

pub fn build_notifier(cfg: &AppConfig) -> anyhow::Result<DealNotifier> {
    let sink: Arc<dyn NotificationSink> = match &cfg.telegram_bot_token {
        Some(token) => Arc::new(TelegramSink::new(token.clone())?),
        None => {
            warn!("TELEGRAM_BOT_TOKEN not set, notifications disabled");
            Arc::new(DisabledSink)
        }
    };
    Ok(DealNotifier::new(sink))
}

/// Full pipeline over the SQLite stores, the Gemini oracle and the catalog API.
pub fn build_ingestor(
    cfg: &AppConfig,
    db: &Db,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<Ingestor> {
    let prices = Arc::new(db.price_store());
    let deals = Arc::new(db.deal_store());

    let oracle: Arc<dyn ScoringOracle> = Arc::new(GeminiOracle::new(
        cfg.require_gemini_key()?,
        cfg.gemini_model.clone(),
        cfg.oracle_timeout,
    )?);

    let source = Arc::new(CatalogClient::new(
        cfg.catalog_base_url.clone(),
        cfg.catalog_store_id,
        cfg.catalog_page_size,
    )?);

    let filter = EligibilityFilter::new(
        prices.clone(),
        deals.clone(),
        prices.clone(),
        cfg.detector_config(),
    );

    let scorer = BatchScorer::new(
        oracle,
        deals.clone(),
        deals,
        prices.clone(),
        build_notifier(cfg)?,
        cfg.scorer_config(),
    )
    .with_shutdown(shutdown);

    Ok(Ingestor::new(source, prices.clone(), prices, filter, scorer))
}

/// Runs `ingestor` every `cfg.poll_interval` until `shutdown` flips.
///
/// Each run is awaited before the next tick; missed ticks are skipped.
pub async fn run_periodic(
    ingestor: &Ingestor,
    cfg: &AppConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(cfg.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_s = cfg.poll_interval.as_secs(), "deal watcher started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match ingestor.run_once().await {
                    Ok(report) => info!(%report, "ingest run complete"),
                    Err(e) => error!(error = ?e, "ingest run failed"),
                }
            }
            _ = shutdown.changed() => break,
        }

        if *shutdown.borrow() {
            break;
        }
    }

    info!("deal watcher stopped");
}

/// Item id or exact catalog name.
async fn resolve_item(catalog: &SQLitePriceStore, key: &str) -> anyhow::Result<CatalogItem> {
    let found = match key.parse::<ItemId>() {
        Ok(id) => catalog.find_item(id).await?,
        Err(_) => catalog.find_by_name(key).await?,
    };
    found.with_context(|| format!("unknown item {key:?}"))
}

pub async fn subscribe(db: &Db, chat_id: &str, items: &[String]) -> anyhow::Result<Subscription> {
    if chat_id.trim().is_empty() {
        bail!("chat id must not be empty");
    }

    let catalog = db.price_store();
    let mut item_ids = BTreeSet::new();
    for key in items {
        item_ids.insert(resolve_item(&catalog, key).await?.id);
    }

    let sub = Subscription {
        endpoint: chat_id.to_string(),
        item_ids,
        updated_at_ms: now_ms(),
    };
    let store: SQLiteDealStore = db.deal_store();
    store.replace_subscription(&sub).await?;
    Ok(sub)
}

pub async fn test_notify(cfg: &AppConfig, chat_id: Option<String>) -> anyhow::Result<bool> {
    if cfg.telegram_bot_token.is_none() {
        return Err(AppError::MissingCredential("TELEGRAM_BOT_TOKEN").into());
    }
    let Some(chat_id) = chat_id.or_else(|| cfg.telegram_chat_id.clone()) else {
        return Err(AppError::MissingCredential("TELEGRAM_CHAT_ID").into());
    };

    let notifier = build_notifier(cfg)?;
    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    Ok(notifier.send_raw(&chat_id, &render_test_message(&stamp)).await)
}
