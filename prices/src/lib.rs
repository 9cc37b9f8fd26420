//! Price history and catalog items.
//!
//! Observations are append-only; the catalog holds the display record for
//! each item. Both are reached through the traits in [`store`].

pub mod model;
pub mod store;
pub mod window;
