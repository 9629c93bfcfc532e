//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`manifest`] - Builders for the four manifest schemas and their
//!   embedded chaos engine fragments.
//! - [`fake`] - In-memory probe service, infra directory, dispatcher and experiment store.

pub mod fake;
pub mod manifest;
