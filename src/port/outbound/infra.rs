//! Infra directory port.

use std::future::Future;

use crate::domain::id::InfraId;
use crate::domain::infra::Infra;
use crate::error::Result;

/// Resolves registered infrastructures. Read-only.
pub trait InfraDirectory: Send + Sync {
    /// Look up an infra by ID.
    fn get_infra(&self, infra_id: &InfraId) -> impl Future<Output = Result<Option<Infra>>> + Send;
}
