//! Chunked scoring of candidates.
//!
//! For each run:
//!   1. Splits the candidates into chunks of `chunk_size`, keeping order.
//!   2. Scores each chunk with one oracle call, bounded by `oracle_timeout`.
//!   3. Upserts a verdict per scored candidate; on oracle failure, or a reply
//!      that leaves a candidate unscored, every candidate of the chunk gets
//!      the fallback verdict.
//!   4. Announces verdicts at or above `notify_threshold` to the item's
//!      subscribers and the broadcast endpoint.
//!   5. Sleeps `inter_chunk_delay` between chunks.

use std::collections::HashSet;
use std::sync::Arc;

use common::time::now_ms;
use deals::model::{DealVerdict, Score};
use deals::store::{DealStore, SubscriptionIndex};
use notifier::{Audience, DealNotification, DealNotifier};
use oracle::types::validate_scores;
use oracle::{OracleError, OracleScore, ScoreRequest, ScoringOracle};
use prices::store::ItemCatalog;
use prices::window::display_discount_rate;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::state::RunReport;
use crate::types::{Candidate, ScorerConfig};

pub struct BatchScorer {
    oracle: Arc<dyn ScoringOracle>,
    deals: Arc<dyn DealStore>,
    subscriptions: Arc<dyn SubscriptionIndex>,
    catalog: Arc<dyn ItemCatalog>,
    notifier: DealNotifier,
    cfg: ScorerConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl BatchScorer {
    pub fn new(
        oracle: Arc<dyn ScoringOracle>,
        deals: Arc<dyn DealStore>,
        subscriptions: Arc<dyn SubscriptionIndex>,
        catalog: Arc<dyn ItemCatalog>,
        notifier: DealNotifier,
        cfg: ScorerConfig,
    ) -> Self {
        Self {
            oracle,
            deals,
            subscriptions,
            catalog,
            notifier,
            cfg,
            shutdown: None,
        }
    }

    /// Remaining chunks are skipped once `true` is observed around a sleep.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Scores `candidates` in order. Never fails; see the report for outcomes.
    #[instrument(skip_all, fields(candidates = candidates.len(), oracle = self.oracle.name()))]
    pub async fn process(&self, candidates: &[Candidate]) -> RunReport {
        let mut report = RunReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        if candidates.is_empty() {
            debug!("no candidates");
            return report;
        }

        let chunks: Vec<&[Candidate]> = candidates.chunks(self.cfg.chunk_size.max(1)).collect();
        report.chunks = chunks.len();

        for (idx, chunk) in chunks.iter().enumerate() {
            if idx > 0 {
                if self.shutdown_requested() {
                    report.chunks_skipped = chunks.len() - idx;
                    break;
                }
                tokio::time::sleep(self.cfg.inter_chunk_delay).await;
                if self.shutdown_requested() {
                    report.chunks_skipped = chunks.len() - idx;
                    break;
                }
            }

            self.score_chunk(idx, chunk, &mut report).await;
        }

        if report.chunks_skipped > 0 {
            warn!(skipped = report.chunks_skipped, "shutdown requested, chunks left unscored");
        }
        info!(%report, "scoring run finished");
        report
    }

    async fn score_chunk(&self, idx: usize, chunk: &[Candidate], report: &mut RunReport) {
        let requests: Vec<ScoreRequest> = chunk.iter().map(Candidate::to_request).collect();

        report.oracle_calls += 1;
        let outcome = match tokio::time::timeout(
            self.cfg.oracle_timeout,
            self.oracle.score_batch(&requests),
        )
        .await
        {
            // partial or malformed output fails the whole chunk, whatever the oracle
            Ok(res) => res.and_then(|scores| validate_scores(&requests, scores)),
            Err(_) => Err(OracleError::Timeout),
        };

        match outcome {
            Ok(scores) => self.apply_scores(chunk, scores, report).await,
            Err(e) => {
                report.oracle_failures += 1;
                error!(chunk = idx, size = chunk.len(), error = %e, "oracle failed, writing fallback verdicts");
                self.apply_fallback(chunk, report).await;
            }
        }
    }

    async fn apply_scores(
        &self,
        chunk: &[Candidate],
        scores: Vec<OracleScore>,
        report: &mut RunReport,
    ) {
        let mut seen = HashSet::new();

        for s in scores {
            let Some(candidate) = chunk.iter().find(|c| c.item_id.to_string() == s.identifier)
            else {
                debug!(identifier = %s.identifier, "score for unknown identifier ignored");
                continue;
            };
            if !seen.insert(candidate.item_id) {
                debug!(identifier = %s.identifier, "duplicate score ignored");
                continue;
            }

            let Some(verdict) = self.write_verdict(candidate, s.score, &s.rationale, report).await
            else {
                continue;
            };
            info!(name = %candidate.item_name, score = %verdict.score, "deal scored");

            if verdict.score.value() >= self.cfg.notify_threshold {
                self.announce(candidate, &verdict, report).await;
            }
        }
    }

    async fn apply_fallback(&self, chunk: &[Candidate], report: &mut RunReport) {
        for candidate in chunk {
            if self
                .write_verdict(
                    candidate,
                    self.cfg.fallback_score,
                    &self.cfg.fallback_rationale,
                    report,
                )
                .await
                .is_some()
            {
                report.fallback_verdicts += 1;
            }
        }
    }

    async fn write_verdict(
        &self,
        candidate: &Candidate,
        score: Score,
        rationale: &str,
        report: &mut RunReport,
    ) -> Option<DealVerdict> {
        let verdict = DealVerdict::new(
            candidate.item_id,
            candidate.average_price,
            candidate.current_price,
            score,
            rationale,
            now_ms(),
        );

        match self.deals.upsert(&verdict).await {
            Ok(stored) => {
                report.verdicts_written += 1;
                Some(stored)
            }
            Err(e) => {
                report.write_failures += 1;
                error!(item_id = %candidate.item_id, error = %e, "verdict upsert failed");
                None
            }
        }
    }

    async fn announce(&self, candidate: &Candidate, verdict: &DealVerdict, report: &mut RunReport) {
        let item = match self.catalog.find_item(candidate.item_id).await {
            Ok(item) => item,
            Err(e) => {
                warn!(item_id = %candidate.item_id, error = %e, "catalog lookup failed, sending without links");
                None
            }
        };

        let notification = DealNotification {
            item_name: candidate.item_name.clone(),
            old_price: verdict.old_price,
            new_price: verdict.new_price,
            discount_rate: display_discount_rate(verdict.old_price, verdict.new_price)
                .unwrap_or_default(),
            rationale: verdict.rationale.clone(),
            image_url: item
                .as_ref()
                .and_then(|i| i.header_image_url().or_else(|| i.image_url.clone())),
            link: item.as_ref().and_then(|i| i.store_link()),
        };

        if let Some(endpoint) = &self.cfg.broadcast_endpoint {
            let ok = self
                .notifier
                .notify(endpoint, &notification, Audience::Broadcast)
                .await;
            count(report, ok);
        }

        let subscribers = match self
            .subscriptions
            .find_subscribers_by_item(candidate.item_id)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                warn!(item_id = %candidate.item_id, error = %e, "subscriber lookup failed");
                return;
            }
        };

        for endpoint in &subscribers {
            let ok = self
                .notifier
                .notify(endpoint, &notification, Audience::Subscriber)
                .await;
            count(report, ok);
        }
    }
}

fn count(report: &mut RunReport, delivered: bool) {
    if delivered {
        report.notifications_sent += 1;
    } else {
        report.notifications_failed += 1;
    }
}
