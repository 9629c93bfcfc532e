//! Experiment lifecycle use cases.

pub mod service;
