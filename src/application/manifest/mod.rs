//! Manifest normalization.
//!
//! Four structurally different manifest schemas are funneled into one
//! normalized form: orchestration labels stamped, embedded chaos engines
//! given probe references, and every fault carrying a weight.
//!
//! # Pipeline
//!
//! ```text
//! raw manifest
//!   -> header check (metadata.name == experiment name)
//!   -> kind dispatch ── Workflow ──────┐
//!                    ├─ CronWorkflow ──┤  one handler per kind
//!                    ├─ ChaosEngine ───┤
//!                    └─ ChaosSchedule ─┘
//!   -> serialize
//! ```
//!
//! Handlers work on an in-memory copy of the document, so a failure at any
//! step leaves nothing written.

mod document;
mod engine;
mod fragment;
pub mod normalizer;
pub mod runtime;
mod weight;
mod workflow;
