//! In-memory doubles of the detector's collaborators.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use deals::model::{DealVerdict, Score};
use deals::store::{DealStore, SubscriptionIndex};
use detector::{BatchScorer, Candidate, ScorerConfig};
use notifier::{DealNotifier, NotificationSink};
use oracle::{OracleError, OracleScore, ScoreRequest, ScoringOracle};
use prices::model::{CatalogItem, ItemId, PriceObservation};
use prices::store::{ItemCatalog, PriceStore};

#[derive(Default)]
pub struct MemPriceStore {
    pub rows: Mutex<Vec<PriceObservation>>,
    pub fail: bool,
}

impl MemPriceStore {
    pub fn with_amounts(item_id: ItemId, amounts: &[f64], observed_at_ms: u64) -> Self {
        let rows = amounts
            .iter()
            .map(|a| PriceObservation::new(item_id, *a, "USD", "Steam", observed_at_ms))
            .collect();
        Self {
            rows: Mutex::new(rows),
            fail: false,
        }
    }
}

#[async_trait]
impl PriceStore for MemPriceStore {
    async fn append(&self, observation: &PriceObservation) -> Result<()> {
        self.rows.lock().unwrap().push(observation.clone());
        Ok(())
    }

    async fn query_range(&self, item_id: ItemId, since_ms: u64) -> Result<Vec<PriceObservation>> {
        if self.fail {
            return Err(anyhow!("price store down"));
        }
        let mut out: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.item_id == item_id && o.observed_at_ms >= since_ms)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.amount.total_cmp(&b.amount));
        Ok(out)
    }

    async fn most_recent(&self, item_id: ItemId, source: &str) -> Result<Option<PriceObservation>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.item_id == item_id && o.source == source)
            .max_by_key(|o| o.observed_at_ms)
            .cloned())
    }

    async fn has_any_from_sources(&self, item_id: ItemId, sources: &[&str]) -> Result<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|o| o.item_id == item_id && sources.contains(&o.source.as_str())))
    }
}

#[derive(Default)]
pub struct MemDealStore {
    pub rows: Mutex<HashMap<ItemId, DealVerdict>>,
    pub writes: Mutex<Vec<DealVerdict>>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MemDealStore {
    pub fn seeded(verdict: DealVerdict) -> Self {
        let store = Self::default();
        store.rows.lock().unwrap().insert(verdict.item_id, verdict);
        store
    }

    pub fn verdict(&self, item_id: ItemId) -> Option<DealVerdict> {
        self.rows.lock().unwrap().get(&item_id).cloned()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl DealStore for MemDealStore {
    async fn find_by_item(&self, item_id: ItemId) -> Result<Option<DealVerdict>> {
        if self.fail_reads {
            return Err(anyhow!("deal store down"));
        }
        Ok(self.verdict(item_id))
    }

    async fn upsert(&self, verdict: &DealVerdict) -> Result<DealVerdict> {
        if self.fail_writes {
            return Err(anyhow!("deal store read-only"));
        }
        let mut rows = self.rows.lock().unwrap();
        let mut stored = verdict.clone();
        if let Some(prev) = rows.get(&verdict.item_id) {
            stored.updated_at_ms = stored.updated_at_ms.max(prev.updated_at_ms + 1);
        }
        rows.insert(stored.item_id, stored.clone());
        self.writes.lock().unwrap().push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
pub struct MemSubscriptions {
    pub by_item: Mutex<HashMap<ItemId, Vec<String>>>,
}

impl MemSubscriptions {
    pub fn follow(&self, item_id: ItemId, endpoint: &str) {
        self.by_item
            .lock()
            .unwrap()
            .entry(item_id)
            .or_default()
            .push(endpoint.to_string());
    }
}

#[async_trait]
impl SubscriptionIndex for MemSubscriptions {
    async fn find_subscribers_by_item(&self, item_id: ItemId) -> Result<Vec<String>> {
        Ok(self
            .by_item
            .lock()
            .unwrap()
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemCatalog {
    pub items: Mutex<HashMap<ItemId, CatalogItem>>,
}

impl MemCatalog {
    pub fn insert(&self, item: CatalogItem) {
        self.items.lock().unwrap().insert(item.id, item);
    }
}

#[async_trait]
impl ItemCatalog for MemCatalog {
    async fn find_item(&self, item_id: ItemId) -> Result<Option<CatalogItem>> {
        Ok(self.items.lock().unwrap().get(&item_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CatalogItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .find(|i| i.name == name)
            .cloned())
    }

    async fn upsert_item(&self, item: &CatalogItem) -> Result<()> {
        self.insert(item.clone());
        Ok(())
    }
}

/// One scripted oracle reply.
#[derive(Clone)]
pub enum Reply {
    /// Every requested id gets this score.
    Score(f64),
    /// Per-id score; ids missing from the map are left out of the reply.
    Scores(HashMap<String, f64>),
    /// Adds an id that was never requested.
    WithStranger(f64),
    Fail,
    /// Never answers within any sane timeout.
    Hang,
}

pub struct ScriptedOracle {
    pub calls: Mutex<Vec<Vec<String>>>,
    pub call_times: Mutex<Vec<tokio::time::Instant>>,
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
}

impl ScriptedOracle {
    pub fn always(reply: Reply) -> Self {
        Self::scripted(Vec::new(), reply)
    }

    pub fn scripted(replies: Vec<Reply>, then: Reply) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
            script: Mutex::new(replies.into()),
            fallback: then,
        }
    }

    pub fn call_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }
}

fn score(identifier: &str, value: f64) -> OracleScore {
    OracleScore {
        identifier: identifier.to_string(),
        score: Score::new(value).unwrap(),
        rationale: format!("scored {value}"),
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn score_batch(&self, batch: &[ScoreRequest]) -> Result<Vec<OracleScore>, OracleError> {
        self.calls
            .lock()
            .unwrap()
            .push(batch.iter().map(|r| r.identifier.clone()).collect());
        self.call_times.lock().unwrap().push(tokio::time::Instant::now());

        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Score(v) => Ok(batch.iter().map(|r| score(&r.identifier, v)).collect()),
            Reply::Scores(map) => Ok(batch
                .iter()
                .filter_map(|r| map.get(&r.identifier).map(|v| score(&r.identifier, *v)))
                .collect()),
            Reply::WithStranger(v) => {
                let mut out: Vec<_> = batch.iter().map(|r| score(&r.identifier, v)).collect();
                out.insert(0, score("not-requested", v));
                Ok(out)
            }
            Reply::Fail => Err(OracleError::Schema("missing id".into())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(OracleError::Timeout)
            }
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(String, String, Option<String>)>>,
    pub fail_for: Vec<String>,
}

impl RecordingSink {
    pub fn endpoints(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|s| s.0.clone()).collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, endpoint: &str, message: &str, image_url: Option<&str>) -> bool {
        self.sent.lock().unwrap().push((
            endpoint.to_string(),
            message.to_string(),
            image_url.map(str::to_string),
        ));
        !self.fail_for.iter().any(|e| e == endpoint)
    }
}

pub fn candidate(name: &str) -> Candidate {
    Candidate {
        item_id: ItemId::new_v4(),
        item_name: name.to_string(),
        current_price: 5.0,
        average_price: 20.0,
        historical_low: 9.99,
    }
}

pub fn candidates(n: usize) -> Vec<Candidate> {
    (0..n).map(|i| candidate(&format!("game-{i}"))).collect()
}

/// Wiring for scorer tests.
pub struct Harness {
    pub oracle: Arc<ScriptedOracle>,
    pub deals: Arc<MemDealStore>,
    pub subs: Arc<MemSubscriptions>,
    pub catalog: Arc<MemCatalog>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(oracle: ScriptedOracle) -> Self {
        Self::with_parts(oracle, MemDealStore::default(), RecordingSink::default())
    }

    pub fn with_parts(oracle: ScriptedOracle, deals: MemDealStore, sink: RecordingSink) -> Self {
        Self {
            oracle: Arc::new(oracle),
            deals: Arc::new(deals),
            subs: Arc::new(MemSubscriptions::default()),
            catalog: Arc::new(MemCatalog::default()),
            sink: Arc::new(sink),
        }
    }

    pub fn scorer(&self, cfg: ScorerConfig) -> BatchScorer {
        BatchScorer::new(
            self.oracle.clone(),
            self.deals.clone(),
            self.subs.clone(),
            self.catalog.clone(),
            DealNotifier::new(self.sink.clone()),
            cfg,
        )
    }
}
