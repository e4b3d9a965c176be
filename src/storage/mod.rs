//! Storage layer for fieldlog.
//!
//! This module provides the SQLite-backed durable store for:
//! - The offline operation queue
//! - The read cache

mod database;
mod migrations;

pub use database::{shared, Database, DrainLease};
pub use migrations::CURRENT_VERSION;
