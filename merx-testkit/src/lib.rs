//! Merx Test Kit
//!
//! Database seeding and inspection helpers shared by the integration test
//! suites of the order and payment services.

mod helpers;

pub use helpers::*;

/// Result type for test helpers.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
