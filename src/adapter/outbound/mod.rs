//! Outbound adapters (driven side).

pub mod dispatch;
pub mod sqlite;
