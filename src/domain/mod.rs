//! Storage- and transport-agnostic domain types.

pub mod error;
pub mod experiment;
pub mod id;
pub mod infra;
pub mod manifest;
pub mod probe;
pub mod weightage;
