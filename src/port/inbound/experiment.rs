//! Experiment lifecycle use cases exposed to the web layer.
//!
//! The caller is already authenticated: every operation receives the acting
//! user and the project scope as plain values.

use std::future::Future;

use crate::domain::experiment::{Experiment, ExperimentFilter, ExperimentKind, ExperimentRequest};
use crate::domain::id::{InfraId, ProjectId, RevisionId};
use crate::domain::manifest::RuntimeCronConfiguration;
use crate::error::Result;
use crate::port::outbound::dispatch::Dispatcher;

/// The inbound service contract of the experiment core.
///
/// `channel` is the dispatch channel of the live infra connections. When it
/// is `None`, dispatch is skipped entirely.
pub trait ExperimentOperations: Send + Sync {
    /// Guard the target infra, then normalize the submitted manifest.
    ///
    /// Returns the rewritten request (experiment ID assigned, manifest
    /// normalized, weightages extended) and the resolved internal kind.
    fn resolve_and_process(
        &self,
        request: ExperimentRequest,
        project_id: &ProjectId,
        revision_id: &RevisionId,
    ) -> impl Future<Output = Result<(ExperimentRequest, ExperimentKind)>> + Send;

    /// Persist a processed request as a new experiment with one revision,
    /// then dispatch a `create` intent.
    fn create(
        &self,
        request: &ExperimentRequest,
        acting_user: &str,
        project_id: &ProjectId,
        kind: ExperimentKind,
        revision_id: &RevisionId,
        channel: Option<&dyn Dispatcher>,
    ) -> impl Future<Output = Result<Experiment>> + Send;

    /// Append a revision (or rewrite one in place), then dispatch an
    /// `update` intent.
    #[allow(clippy::too_many_arguments)]
    fn update(
        &self,
        request: &ExperimentRequest,
        acting_user: &str,
        kind: ExperimentKind,
        revision_id: &RevisionId,
        replace_in_place: bool,
        project_id: &ProjectId,
        channel: Option<&dyn Dispatcher>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Soft-delete the experiment and its runs, then dispatch a
    /// `workflow_delete` intent to the snapshot's infra.
    fn delete(
        &self,
        filter: &ExperimentFilter,
        snapshot: &Experiment,
        acting_user: &str,
        channel: Option<&dyn Dispatcher>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Prepare a stored cron workflow manifest for one scheduled run.
    fn runtime_cron_configuration(
        &self,
        manifest: &str,
        infra_id: &InfraId,
    ) -> Result<RuntimeCronConfiguration>;
}
