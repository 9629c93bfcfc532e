//! Manifest validation errors.
//!
//! These errors are raised while a submitted manifest is parsed and
//! normalized. All of them are terminal for the call: normalization works on
//! an in-memory copy, so nothing has been written when one is returned.
//!
//! # Examples
//!
//! ```
//! use faultline::domain::error::ManifestError;
//! use faultline::domain::manifest::ManifestKind;
//!
//! let result = ManifestKind::parse("Deployment");
//! assert!(matches!(result, Err(ManifestError::UnsupportedKind(_))));
//! ```

use thiserror::Error;

/// Errors that occur when a manifest violates the accepted shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// The document (or a nested fragment) is not well formed.
    #[error("failed to parse {what}: {reason}")]
    Parse {
        /// Which document failed to parse.
        what: &'static str,
        /// Parser message.
        reason: String,
    },

    /// The declared object name differs from the experiment name.
    #[error("{kind} name doesn't match: expected '{expected}', found '{found}'")]
    NameMismatch {
        /// Kind read from the manifest.
        kind: String,
        /// Experiment name supplied by the caller.
        expected: String,
        /// Name declared in the manifest metadata.
        found: String,
    },

    /// The manifest kind is none of the four supported schemas.
    #[error("unsupported manifest kind '{0}': only workflows, cron workflows, chaos engines and chaos schedules are supported")]
    UnsupportedKind(String),

    /// A cron workflow without a schedule.
    #[error("failed to process cron workflow, cron syntax not provided in manifest")]
    MissingSchedule,

    /// A chaos engine whose fault name resolves to the empty string.
    #[error("empty chaos experiment name")]
    EmptyFaultName,

    /// A chaos engine with no declared sub-experiments.
    #[error("no experiments specified in chaos engine '{0}'")]
    NoExperiments(String),

    /// A chaos engine with no probes and no `probeRef` annotation.
    #[error("no probes specified in chaos engine '{0}'")]
    NoProbes(String),

    /// A preexisting weight label that is not an integer.
    #[error("invalid weight label '{value}' for fault '{fault}'")]
    InvalidWeight {
        /// Fault the label belongs to.
        fault: String,
        /// Raw label value.
        value: String,
    },

    /// A document without a metadata block where one is required.
    #[error("metadata not found in {0}")]
    MissingMetadata(&'static str),

    /// Re-serialization failed.
    #[error("failed to serialize {what}: {reason}")]
    Serialize {
        /// Which document failed to serialize.
        what: &'static str,
        /// Serializer message.
        reason: String,
    },
}

impl ManifestError {
    /// True for name/schedule mismatches reported verbatim to the caller.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::NameMismatch { .. } | Self::MissingSchedule)
    }
}
