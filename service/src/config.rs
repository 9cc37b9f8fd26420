use std::str::FromStr;
use std::time::Duration;

use common::time::{DAY_MS, HOUR_MS};
use deals::model::Score;
use detector::policy::{FALLBACK_RATIONALE, FALLBACK_SCORE};
use detector::{DetectorConfig, ProvisionalScores, ScorerConfig};
use oracle::gemini::DEFAULT_MODEL;

use crate::catalog::DEFAULT_BASE_URL;
use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// JSON logs when set.
    pub production: bool,

    // =========================
    // Collaborators
    // =========================
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub oracle_timeout: Duration,

    pub telegram_bot_token: Option<String>,

    /// Operator channel; receives every confirmed deal and test messages.
    pub telegram_chat_id: Option<String>,

    pub catalog_base_url: String,
    pub catalog_store_id: u32,
    pub catalog_page_size: u32,

    // =========================
    // Pipeline
    // =========================
    pub poll_interval: Duration,
    pub chunk_size: usize,
    pub chunk_delay: Duration,
    pub cooldown_hours: u64,
    pub discount_threshold_pct: f64,
    pub analysis_window_days: u64,
    pub notify_threshold: f64,

    /// Stored scores that do not hold the cooldown.
    pub provisional_scores: Vec<f64>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let chunk_size: usize = parse(&get, "SCORING_CHUNK_SIZE", 3)?;
        if chunk_size == 0 {
            return Err(invalid("SCORING_CHUNK_SIZE", "0"));
        }

        // a zero period panics the ticker; a zero timeout fails every chunk
        let poll_interval_secs: u64 = parse(&get, "POLL_INTERVAL_SECS", 3600)?;
        if poll_interval_secs == 0 {
            return Err(invalid("POLL_INTERVAL_SECS", "0"));
        }
        let oracle_timeout_secs: u64 = parse(&get, "ORACLE_TIMEOUT_SECS", 30)?;
        if oracle_timeout_secs == 0 {
            return Err(invalid("ORACLE_TIMEOUT_SECS", "0"));
        }

        let discount_threshold_pct: f64 = parse(&get, "DISCOUNT_THRESHOLD_PCT", 70.0)?;
        if !discount_threshold_pct.is_finite() {
            return Err(invalid(
                "DISCOUNT_THRESHOLD_PCT",
                &discount_threshold_pct.to_string(),
            ));
        }

        let notify_threshold: f64 = parse(&get, "NOTIFY_SCORE_THRESHOLD", 90.0)?;
        if Score::new(notify_threshold).is_err() {
            return Err(invalid(
                "NOTIFY_SCORE_THRESHOLD",
                &notify_threshold.to_string(),
            ));
        }

        let provisional_scores = match get("PROVISIONAL_SCORES") {
            Some(raw) => parse_score_list("PROVISIONAL_SCORES", &raw)?,
            None => ProvisionalScores::default().as_slice().to_vec(),
        };

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://dealwatch.db?mode=rwc".to_string()),
            production: get("APP_ENV").is_some_and(|v| v == "production"),

            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            oracle_timeout: Duration::from_secs(oracle_timeout_secs),

            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),

            catalog_base_url: get("CATALOG_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            catalog_store_id: parse(&get, "CATALOG_STORE_ID", 1)?,
            catalog_page_size: parse(&get, "CATALOG_PAGE_SIZE", 50)?,

            poll_interval: Duration::from_secs(poll_interval_secs),
            chunk_size,
            chunk_delay: Duration::from_secs(parse(&get, "SCORING_CHUNK_DELAY_SECS", 15)?),
            cooldown_hours: parse(&get, "COOLDOWN_HOURS", 24)?,
            discount_threshold_pct,
            analysis_window_days: parse(&get, "ANALYSIS_WINDOW_DAYS", 90)?,
            notify_threshold,
            provisional_scores,
        })
    }

    pub fn require_gemini_key(&self) -> Result<&str, AppError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(AppError::MissingCredential("GEMINI_API_KEY"))
    }

    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            cooldown_ms: self.cooldown_hours.saturating_mul(HOUR_MS),
            window_ms: self.analysis_window_days.saturating_mul(DAY_MS),
            discount_threshold_pct: self.discount_threshold_pct,
            provisional: ProvisionalScores::new(self.provisional_scores.iter().copied()),
            ..Default::default()
        }
    }

    /// Broadcasts only when a bot token is configured.
    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            chunk_size: self.chunk_size,
            inter_chunk_delay: self.chunk_delay,
            oracle_timeout: self.oracle_timeout,
            notify_threshold: self.notify_threshold,
            fallback_score: Score::clamped(FALLBACK_SCORE),
            fallback_rationale: FALLBACK_RATIONALE.to_string(),
            broadcast_endpoint: self
                .telegram_bot_token
                .as_ref()
                .and(self.telegram_chat_id.clone()),
        }
    }
}

fn invalid(key: &'static str, value: &str) -> AppError {
    AppError::InvalidConfig {
        key,
        value: value.to_string(),
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, &raw)),
        None => Ok(default),
    }
}

fn parse_score_list(key: &'static str, raw: &str) -> Result<Vec<f64>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .and_then(|v| Score::new(v).ok())
                .map(Score::value)
                .ok_or_else(|| invalid(key, raw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = load(&[]).unwrap();

        assert_eq!(cfg.database_url, "sqlite://dealwatch.db?mode=rwc");
        assert!(!cfg.production);
        assert_eq!(cfg.gemini_model, "gemini-2.5-flash");
        assert_eq!(cfg.chunk_size, 3);
        assert_eq!(cfg.chunk_delay, Duration::from_secs(15));
        assert_eq!(cfg.poll_interval, Duration::from_secs(3600));
        assert_eq!(cfg.provisional_scores, vec![50.0, 75.0]);

        let det = cfg.detector_config();
        assert_eq!(det.cooldown_ms, 24 * HOUR_MS);
        assert_eq!(det.window_ms, 90 * DAY_MS);
        assert_eq!(det.discount_threshold_pct, 70.0);

        let sc = cfg.scorer_config();
        assert_eq!(sc.notify_threshold, 90.0);
        assert_eq!(sc.fallback_score.value(), 75.0);
        assert!(sc.broadcast_endpoint.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load(&[
            ("APP_ENV", "production"),
            ("SCORING_CHUNK_SIZE", "5"),
            ("COOLDOWN_HOURS", "6"),
            ("PROVISIONAL_SCORES", " 75 , 60 "),
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "-100"),
        ])
        .unwrap();

        assert!(cfg.production);
        assert_eq!(cfg.scorer_config().chunk_size, 5);
        assert_eq!(cfg.detector_config().cooldown_ms, 6 * HOUR_MS);
        assert_eq!(
            cfg.detector_config().provisional.as_slice(),
            &[60.0, 75.0]
        );
        assert_eq!(cfg.scorer_config().broadcast_endpoint.as_deref(), Some("-100"));
    }

    #[test]
    fn chat_id_without_token_does_not_broadcast() {
        let cfg = load(&[("TELEGRAM_CHAT_ID", "-100")]).unwrap();
        assert!(cfg.scorer_config().broadcast_endpoint.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("SCORING_CHUNK_SIZE", "0")]),
            Err(AppError::InvalidConfig { key: "SCORING_CHUNK_SIZE", .. })
        ));
        assert!(load(&[("POLL_INTERVAL_SECS", "soon")]).is_err());
        assert!(load(&[("NOTIFY_SCORE_THRESHOLD", "120")]).is_err());
        assert!(load(&[("PROVISIONAL_SCORES", "50,abc")]).is_err());
    }

    #[test]
    fn rejects_zero_durations() {
        assert!(matches!(
            load(&[("POLL_INTERVAL_SECS", "0")]),
            Err(AppError::InvalidConfig { key: "POLL_INTERVAL_SECS", .. })
        ));
        assert!(matches!(
            load(&[("ORACLE_TIMEOUT_SECS", "0")]),
            Err(AppError::InvalidConfig { key: "ORACLE_TIMEOUT_SECS", .. })
        ));

        let cfg = load(&[("POLL_INTERVAL_SECS", "1"), ("ORACLE_TIMEOUT_SECS", "1")]).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.oracle_timeout, Duration::from_secs(1));
    }

    #[test]
    fn gemini_key_is_required_on_demand() {
        let cfg = load(&[]).unwrap();
        assert!(matches!(
            cfg.require_gemini_key(),
            Err(AppError::MissingCredential("GEMINI_API_KEY"))
        ));

        let cfg = load(&[("GEMINI_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.require_gemini_key().unwrap(), "k");
    }
}
