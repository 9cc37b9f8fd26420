//! Google Gemini client for batch deal scoring.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::ScoringOracle;
use crate::types::{OracleError, OracleScore, ScoreRequest, parse_scores, validate_scores};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone)]
pub struct GeminiOracle {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiOracle {
    /// `timeout` bounds each HTTP call; the pipeline applies its own bound on top.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Builds the instruction block sent with every batch.
pub fn build_prompt(batch: &[ScoreRequest]) -> String {
    let items = batch
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "Item {}:\nID: {}\nGame: {}\nCurrent: {}\nAvg: {}\nLow: {}",
                i + 1,
                r.identifier,
                r.name,
                r.current_price,
                r.average_price,
                r.historical_low
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"You are a game price analysis expert. Analyze these {count} deals.
For each, decide whether the discount is REAL or MANIPULATED.

Rules:
1. If the current price is above the average or close to it, the deal is MANIPULATED.
2. If the current price is at or below the historical low, the deal is REAL (score 100).
3. At most 15 words of reasoning per item.

Input data:
{items}

Output ONLY a raw JSON array (no markdown, no backticks) with exactly one entry per item:
[{{"id": "...", "score": 0-100, "reasoning": "..."}}]"#,
        count = batch.len(),
    )
}

fn extract_text(resp: GenerateResponse) -> Result<String, OracleError> {
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(OracleError::Schema("response carried no text".into()));
    }
    Ok(text)
}

#[async_trait]
impl ScoringOracle for GeminiOracle {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip(self, batch), fields(model = %self.model, batch_len = batch.len()))]
    async fn score_batch(&self, batch: &[ScoreRequest]) -> Result<Vec<OracleScore>, OracleError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(batch),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Http(e)
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = extract_text(resp.json::<GenerateResponse>().await?)?;
        debug!(chars = text.len(), "oracle response received");

        let scores = parse_scores(&text)?;
        validate_scores(batch, scores)
    }
}
