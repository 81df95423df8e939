//! Postgres access for the `crunch` table.
//!
//! Holds pool construction, the statements used by the sync pipeline and helpers to classify
//! database errors.

pub mod crunch;
pub mod db;
#[cfg(feature = "test-utils")]
pub mod sqlx;
