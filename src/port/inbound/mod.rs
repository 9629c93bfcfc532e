//! Inbound (driving) ports consumed by inbound adapters.
//!
//! Inbound ports expose application capabilities to external drivers such as
//! the web layer and the command-line interface.
//!
//! # Modules
//!
//! - [`experiment`]: Experiment lifecycle use cases (process, create, update, delete)

pub mod experiment;
