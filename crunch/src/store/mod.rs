//! Persistence of crunch records.

pub mod base;
pub mod memory;
pub mod postgres;

pub use base::{BatchWriteReport, CrunchStore};
