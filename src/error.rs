use thiserror::Error;

use crate::domain::error::ManifestError;
use crate::domain::id::{ExperimentId, InfraId, ProjectId, RevisionId};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Infra guard failures, raised before any normalization or persistence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InfraError {
    #[error("failed to get infra details: infra '{0}' not found")]
    NotFound(InfraId),

    #[error("experiment scheduling failed due to inactive infra '{0}'")]
    Inactive(InfraId),

    #[error("project '{project_id}' doesn't match with the infra '{infra_id}' identifiers")]
    ProjectMismatch {
        infra_id: InfraId,
        project_id: ProjectId,
    },
}

/// Probe provisioning failures propagated from the probe subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("failed to provision probe '{name}': {reason}")]
    Provisioning { name: String, reason: String },
}

/// Experiment store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("experiment '{experiment_id}' already exists in project '{project_id}'")]
    DuplicateExperiment {
        experiment_id: ExperimentId,
        project_id: ProjectId,
    },

    #[error("experiment '{experiment_id}' not found in project '{project_id}'")]
    NotFound {
        experiment_id: ExperimentId,
        project_id: ProjectId,
    },

    #[error("revision '{revision_id}' not found on experiment '{experiment_id}'")]
    RevisionNotFound {
        experiment_id: ExperimentId,
        revision_id: RevisionId,
    },

    #[error("persistence error: {0}")]
    Persistence(String),

    /// Rolling back a failed transaction failed; consistency is no longer guaranteed.
    #[error("transaction abort failed: {0}")]
    TransactionAbort(String),
}

impl StoreError {
    /// True for the not-found family.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::RevisionNotFound { .. })
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

/// Dispatch failures. Reported, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("infra '{0}' is not connected")]
    Offline(InfraId),

    #[error("dispatch queue for infra '{0}' is full")]
    QueueFull(InfraId),

    #[error("connection to infra '{0}' is closed")]
    Closed(InfraId),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Infra(#[from] InfraError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("{operation} exceeded the request deadline")]
    DeadlineExceeded { operation: &'static str },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the error is a caller validation failure (name/schedule mismatch).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Manifest(e) if e.is_validation())
    }

    /// True when the error is a store not-found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}
