//! Deal detection and batched scoring.
//!
//! [`eligibility::EligibilityFilter`] turns a fresh price into at most one
//! [`types::Candidate`]; [`engine::BatchScorer`] scores candidates in chunks,
//! persists verdicts and dispatches alerts.

pub mod eligibility;
pub mod engine;
pub mod policy;
pub mod state;
pub mod types;

pub use eligibility::{Eligibility, EligibilityFilter};
pub use engine::BatchScorer;
pub use policy::ProvisionalScores;
pub use state::RunReport;
pub use types::{Candidate, DetectorConfig, ScorerConfig};
