//! Dispatch adapters.
//!
//! Deliver committed mutations to connected infra agents.

pub mod connection;
