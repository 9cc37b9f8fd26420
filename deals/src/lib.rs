//! Deal verdicts (one per item) and the subscriber reverse index.

pub mod model;
pub mod store;
