//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: experiment
//! persistence, probe creation, infra lookup and agent dispatch.

pub mod dispatch;
pub mod infra;
pub mod probe;
pub mod store;
