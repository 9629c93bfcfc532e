//! Probe subsystem port.

use std::future::Future;

use crate::domain::id::ProjectId;
use crate::domain::probe::{Probe, ProbeRequest};
use crate::error::Result;

/// Creates first-class probe entities.
///
/// Every call creates a new probe; implementations must not deduplicate.
pub trait ProbeService: Send + Sync {
    /// Create a probe in `project_id` and return it.
    fn add_probe(
        &self,
        request: ProbeRequest,
        project_id: &ProjectId,
    ) -> impl Future<Output = Result<Probe>> + Send;
}
