//! Faultline - control plane for chaos experiments.
//!
//! Accepts experiment manifests in four schemas (Workflow, CronWorkflow,
//! ChaosEngine, ChaosSchedule), normalizes them, provisions the probes they
//! declare, keeps a revision history per experiment and notifies the
//! target infrastructure agent of every committed change.
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Experiments, revisions, manifests, probes, weights
//! - [`port`] - Inbound service contract and outbound store/probe/infra/dispatch traits
//! - [`application`] - Manifest normalizer, probe provisioner, experiment service
//! - [`adapter`] - SQLite persistence, live infra connections, the CLI
//! - [`infrastructure`] - Configuration, logging and runtime wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use faultline::infrastructure::bootstrap::Runtime;
//! use faultline::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     let runtime = Runtime::start(&config)?;
//!     runtime.shutdown();
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
