//! Registered execution agents.

use super::id::{InfraId, ProjectId};

/// A remote execution agent bound to one project.
///
/// Read-only to the experiment core; consulted as a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Infra {
    pub infra_id: InfraId,
    pub project_id: ProjectId,
    pub name: String,
    pub is_active: bool,
}
