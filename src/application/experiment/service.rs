//! Experiment lifecycle service.
//!
//! Implements [`ExperimentOperations`]: guard the target infra, normalize
//! the manifest, persist through the store, then notify the infra agent.
//! Dispatch runs only after a successful commit and its failures are
//! logged, never returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::application::manifest::normalizer::{ManifestNormalizer, NormalizeInput};
use crate::application::manifest::runtime;
use crate::domain::experiment::{
    Audit, Experiment, ExperimentFilter, ExperimentKind, ExperimentRequest, ExperimentUpdate,
    Revision, UpdateMode,
};
use crate::domain::id::{ExperimentId, InfraId, ProjectId, RevisionId};
use crate::domain::manifest::RuntimeCronConfiguration;
use crate::domain::weightage;
use crate::error::{Error, InfraError, Result, StoreError};
use crate::port::inbound::experiment::ExperimentOperations;
use crate::port::outbound::dispatch::{DispatchIntent, DispatchRequest, Dispatcher};
use crate::port::outbound::infra::InfraDirectory;
use crate::port::outbound::probe::ProbeService;
use crate::port::outbound::store::ExperimentStore;

/// Default per-request deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// The experiment core, wired to its outbound ports.
pub struct ExperimentService<S, P, I> {
    store: Arc<S>,
    infra: Arc<I>,
    normalizer: ManifestNormalizer<P>,
    deadline: Duration,
}

impl<S, P, I> ExperimentService<S, P, I>
where
    S: ExperimentStore,
    P: ProbeService,
    I: InfraDirectory,
{
    pub fn new(store: Arc<S>, probes: Arc<P>, infra: Arc<I>) -> Self {
        Self {
            store,
            infra,
            normalizer: ManifestNormalizer::new(probes),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Override the per-request deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// The store this service writes through.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Reject unknown, inactive and foreign infras.
    async fn guard(&self, infra_id: &InfraId, project_id: &ProjectId) -> Result<()> {
        let infra = self
            .infra
            .get_infra(infra_id)
            .await?
            .ok_or_else(|| InfraError::NotFound(infra_id.clone()))?;
        if !infra.is_active {
            return Err(InfraError::Inactive(infra_id.clone()).into());
        }
        if &infra.project_id != project_id {
            return Err(InfraError::ProjectMismatch {
                infra_id: infra_id.clone(),
                project_id: project_id.clone(),
            }
            .into());
        }
        Ok(())
    }

    async fn within<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.deadline, fut)
            .await
            .map_err(|_| Error::DeadlineExceeded { operation })?
    }
}

/// Best-effort push to the infra agent.
fn notify(channel: Option<&dyn Dispatcher>, request: DispatchRequest) {
    let Some(channel) = channel else {
        debug!(intent = %request.intent, "No dispatch channel, skipping");
        return;
    };
    let infra_id = request.infra_id.clone();
    let intent = request.intent;
    match channel.dispatch(request) {
        Ok(()) => debug!(infra_id = %infra_id, intent = %intent, "Dispatched to infra"),
        Err(e) => warn!(
            infra_id = %infra_id,
            intent = %intent,
            error = %e,
            "Dispatch failed, committed state kept"
        ),
    }
}

/// Cron syntax is only persisted for cron experiments.
fn stored_cron_syntax(kind: ExperimentKind, request: &ExperimentRequest) -> String {
    if kind == ExperimentKind::Cron {
        request.cron_syntax.clone()
    } else {
        String::new()
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl<S, P, I> ExperimentOperations for ExperimentService<S, P, I>
where
    S: ExperimentStore,
    P: ProbeService,
    I: InfraDirectory,
{
    async fn resolve_and_process(
        &self,
        mut request: ExperimentRequest,
        project_id: &ProjectId,
        revision_id: &RevisionId,
    ) -> Result<(ExperimentRequest, ExperimentKind)> {
        self.within("resolve_and_process", async move {
            self.guard(&request.infra_id, project_id).await?;

            let experiment_id = request
                .experiment_id
                .take()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(ExperimentId::generate);
            let overrides = weightage::overrides(&request.weightages);
            let normalized = self
                .normalizer
                .normalize(NormalizeInput {
                    manifest: &request.manifest,
                    expected_name: &request.name,
                    experiment_id: &experiment_id,
                    infra_id: &request.infra_id,
                    revision_id,
                    project_id,
                    overrides: &overrides,
                })
                .await?;

            let kind = normalized.kind.experiment_kind();
            request.manifest = normalized.manifest;
            weightage::merge(&mut request.weightages, normalized.new_weightages);
            if let Some(cron_syntax) = normalized.cron_syntax {
                request.cron_syntax = cron_syntax;
            }
            debug!(
                experiment_id = %experiment_id,
                manifest_kind = %normalized.kind,
                weightages = request.weightages.len(),
                "Experiment processed"
            );
            request.experiment_id = Some(experiment_id);
            Ok((request, kind))
        })
        .await
    }

    async fn create(
        &self,
        request: &ExperimentRequest,
        acting_user: &str,
        project_id: &ProjectId,
        kind: ExperimentKind,
        revision_id: &RevisionId,
        channel: Option<&dyn Dispatcher>,
    ) -> Result<Experiment> {
        let now = now_millis();
        let experiment = Experiment {
            experiment_id: request
                .experiment_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(ExperimentId::generate),
            project_id: project_id.clone(),
            infra_id: request.infra_id.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            tags: request.tags.clone(),
            kind,
            cron_syntax: stored_cron_syntax(kind, request),
            is_custom: request.is_custom,
            weightages: request.weightages.clone(),
            revisions: vec![Revision {
                revision_id: revision_id.clone(),
                manifest: request.manifest.clone(),
                updated_at: now,
                weightages: request.weightages.clone(),
            }],
            audit: Audit::created(acting_user, now),
        };

        self.within("create", self.store.create(&experiment)).await?;
        info!(
            experiment_id = %experiment.experiment_id,
            project_id = %project_id,
            kind = %kind,
            revision_id = %revision_id,
            "Experiment created"
        );

        notify(
            channel,
            DispatchRequest {
                project_id: project_id.clone(),
                infra_id: experiment.infra_id.clone(),
                intent: DispatchIntent::Create,
                manifest: Some(request.manifest.clone()),
                acting_user: acting_user.to_string(),
                experiment_id: None,
            },
        );
        Ok(experiment)
    }

    async fn update(
        &self,
        request: &ExperimentRequest,
        acting_user: &str,
        kind: ExperimentKind,
        revision_id: &RevisionId,
        replace_in_place: bool,
        project_id: &ProjectId,
        channel: Option<&dyn Dispatcher>,
    ) -> Result<()> {
        let experiment_id = request
            .experiment_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::NotFound {
                experiment_id: ExperimentId::default(),
                project_id: project_id.clone(),
            })?;
        let filter = ExperimentFilter::new(experiment_id, project_id.clone());
        let mode = UpdateMode::from_replace_flag(replace_in_place);
        let now = now_millis();
        let update = ExperimentUpdate {
            kind,
            cron_syntax: stored_cron_syntax(kind, request),
            name: request.name.clone(),
            description: request.description.clone(),
            tags: request.tags.clone(),
            infra_id: request.infra_id.clone(),
            is_custom: request.is_custom,
            weightages: request.weightages.clone(),
            revision: Revision {
                revision_id: revision_id.clone(),
                manifest: request.manifest.clone(),
                updated_at: now,
                weightages: request.weightages.clone(),
            },
            updated_by: acting_user.to_string(),
            updated_at: now,
        };

        self.within("update", self.store.update(&filter, &update, mode))
            .await?;
        info!(
            experiment_id = %filter.experiment_id,
            project_id = %project_id,
            revision_id = %revision_id,
            replace_in_place,
            "Experiment updated"
        );

        notify(
            channel,
            DispatchRequest {
                project_id: project_id.clone(),
                infra_id: request.infra_id.clone(),
                intent: DispatchIntent::Update,
                manifest: Some(request.manifest.clone()),
                acting_user: acting_user.to_string(),
                experiment_id: None,
            },
        );
        Ok(())
    }

    async fn delete(
        &self,
        filter: &ExperimentFilter,
        snapshot: &Experiment,
        acting_user: &str,
        channel: Option<&dyn Dispatcher>,
    ) -> Result<()> {
        self.within("delete", self.store.soft_delete(filter, acting_user))
            .await?;
        info!(
            experiment_id = %filter.experiment_id,
            project_id = %filter.project_id,
            "Experiment removed"
        );

        notify(
            channel,
            DispatchRequest {
                project_id: snapshot.project_id.clone(),
                infra_id: snapshot.infra_id.clone(),
                intent: DispatchIntent::WorkflowDelete,
                manifest: None,
                acting_user: acting_user.to_string(),
                experiment_id: Some(snapshot.experiment_id.clone()),
            },
        );
        Ok(())
    }

    fn runtime_cron_configuration(
        &self,
        manifest: &str,
        infra_id: &InfraId,
    ) -> Result<RuntimeCronConfiguration> {
        Ok(runtime::runtime_cron_configuration(manifest, infra_id)?)
    }
}
