//! Helpers for testing sync runs.
//!
//! - [`database`] spawns an isolated Postgres database with the `crunch` table migrated.
//! - [`source_file`] writes results files to a temporary location.
//! - [`fault_store`] wraps a [`crate::store::CrunchStore`] to fail chosen operations.
//! - `failpoints` configures fail points for a test, available with the `failpoints` feature.

pub mod database;
#[cfg(feature = "failpoints")]
pub mod failpoints;
pub mod fault_store;
pub mod source_file;
