//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (the document store, the probe subsystem, live agents).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │   ExperimentOperations  │  (inbound)
//!                    │                         │
//!     ┌──────────────┤  Normalizer + Service   ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                  │              │                     │
//!     ▼                  ▼              ▼                     ▼
//! ┌─────────┐     ┌────────────┐  ┌───────────┐        ┌────────────┐
//! │  Probe  │     │ Experiment │  │   Infra   │        │ Dispatcher │
//! │ Service │     │   Store    │  │ Directory │        │            │
//! └─────────┘     └────────────┘  └───────────┘        └────────────┘
//! ```

pub mod inbound;
pub mod outbound;
