use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use deals::model::Score;

/// Summary of one candidate sent to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRequest {
    pub identifier: String,
    pub name: String,
    pub current_price: f64,
    pub average_price: f64,
    pub historical_low: f64,
}

/// One scored entry as returned by the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleScore {
    #[serde(rename = "id")]
    pub identifier: String,
    pub score: Score,
    #[serde(rename = "reasoning")]
    pub rationale: String,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("oracle call timed out")]
    Timeout,

    #[error("oracle output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("oracle output violates schema: {0}")]
    Schema(String),
}

/// Parses the oracle's text output into scores.
///
/// The output must be a bare JSON array. A single surrounding code fence is
/// tolerated; any other prose is a parse failure.
pub fn parse_scores(text: &str) -> Result<Vec<OracleScore>, OracleError> {
    let body = strip_code_fence(text.trim());
    Ok(serde_json::from_str(body)?)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Checks a parsed response against the request it answers.
///
/// Every requested identifier must be scored and every rationale must be
/// non-empty. Entries for identifiers that were not requested are kept; the
/// caller ignores them.
pub fn validate_scores(
    requested: &[ScoreRequest],
    scores: Vec<OracleScore>,
) -> Result<Vec<OracleScore>, OracleError> {
    if let Some(blank) = scores.iter().find(|s| s.rationale.trim().is_empty()) {
        return Err(OracleError::Schema(format!(
            "empty rationale for {}",
            blank.identifier
        )));
    }

    let returned: HashSet<&str> = scores.iter().map(|s| s.identifier.as_str()).collect();
    let missing: Vec<&str> = requested
        .iter()
        .map(|r| r.identifier.as_str())
        .filter(|id| !returned.contains(id))
        .collect();

    if !missing.is_empty() {
        return Err(OracleError::Schema(format!(
            "missing scores for {}",
            missing.join(", ")
        )));
    }

    Ok(scores)
}
