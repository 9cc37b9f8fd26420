//! Remote scoring of deal candidates.
//!
//! [`api::ScoringOracle`] is the seam the pipeline depends on;
//! [`gemini::GeminiOracle`] is the production client. Every response passes
//! through [`types::validate_scores`] before the caller sees it.

pub mod api;
pub mod gemini;
pub mod types;

pub use api::ScoringOracle;
pub use types::{OracleError, OracleScore, ScoreRequest};
