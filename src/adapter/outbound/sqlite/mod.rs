//! SQLite persistence adapters.
//!
//! Provides SQLite-backed implementations of the experiment store, the
//! probe subsystem and the infra directory using Diesel ORM.

pub mod database;
pub mod infra;
pub mod probe;
pub mod store;
pub mod transaction;
