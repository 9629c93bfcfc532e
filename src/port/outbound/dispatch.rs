//! Dispatch port for pushing manifests to live infra agents.
//!
//! Dispatch is advisory: it runs after the store has committed, and a
//! failure never undoes committed state.

use std::fmt;

use serde::Serialize;

use crate::domain::id::{ExperimentId, InfraId, ProjectId};
use crate::error::DispatchError;

/// What the agent is asked to do with the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchIntent {
    Create,
    Update,
    WorkflowDelete,
}

impl DispatchIntent {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::WorkflowDelete => "workflow_delete",
        }
    }
}

impl fmt::Display for DispatchIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message delivered to an infra agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRequest {
    pub project_id: ProjectId,
    pub infra_id: InfraId,
    pub intent: DispatchIntent,
    /// Normalized manifest. Absent for deletes.
    pub manifest: Option<String>,
    pub acting_user: String,
    pub experiment_id: Option<ExperimentId>,
}

/// Trait for delivering dispatch requests to infra agents.
///
/// Implementations must not block: they enqueue and return.
pub trait Dispatcher: Send + Sync {
    /// Push a request to the agent owning `request.infra_id`.
    ///
    /// # Errors
    /// Returns a [`DispatchError`] when the agent is offline or its queue
    /// cannot take the message. Callers log and continue.
    fn dispatch(&self, request: DispatchRequest) -> Result<(), DispatchError>;
}
