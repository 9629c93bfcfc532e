//! In-memory fakes for the outbound ports.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::domain::experiment::{Experiment, ExperimentFilter, ExperimentUpdate, UpdateMode};
use crate::domain::id::{InfraId, ProjectId};
use crate::domain::infra::Infra;
use crate::domain::probe::{Probe, ProbeRequest};
use crate::error::{DispatchError, Error, Result, StoreError};
use crate::port::outbound::dispatch::{DispatchRequest, Dispatcher};
use crate::port::outbound::infra::InfraDirectory;
use crate::port::outbound::probe::ProbeService;
use crate::port::outbound::store::ExperimentStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Probe service that records every creation request.
#[derive(Debug, Default)]
pub struct RecordingProbeService {
    created: Mutex<Vec<ProbeRequest>>,
    failure: Option<String>,
}

impl RecordingProbeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service whose every call fails with a connection error.
    pub fn failing(reason: &str) -> Self {
        Self {
            created: Mutex::default(),
            failure: Some(reason.to_string()),
        }
    }

    /// Requests received so far, including failed ones.
    pub fn created(&self) -> Vec<ProbeRequest> {
        lock(&self.created).clone()
    }
}

impl ProbeService for RecordingProbeService {
    async fn add_probe(&self, request: ProbeRequest, project_id: &ProjectId) -> Result<Probe> {
        let probe = Probe {
            probe_id: format!("probe-{}", lock(&self.created).len() + 1),
            name: request.name.clone(),
            project_id: project_id.clone(),
            probe_type: request.probe_type.clone(),
        };
        lock(&self.created).push(request);
        match &self.failure {
            Some(reason) => Err(Error::Connection(reason.clone())),
            None => Ok(probe),
        }
    }
}

/// Fixed set of registered infras.
#[derive(Debug, Default)]
pub struct StaticInfraDirectory {
    infras: HashMap<InfraId, Infra>,
}

impl StaticInfraDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, infra: Infra) -> Self {
        self.infras.insert(infra.infra_id.clone(), infra);
        self
    }
}

impl InfraDirectory for StaticInfraDirectory {
    async fn get_infra(&self, infra_id: &InfraId) -> Result<Option<Infra>> {
        Ok(self.infras.get(infra_id).cloned())
    }
}

/// An active infra in `project`.
pub fn active_infra(infra_id: &str, project: &str) -> Infra {
    Infra {
        infra_id: InfraId::new(infra_id),
        project_id: ProjectId::new(project),
        name: format!("{infra_id}-agent"),
        is_active: true,
    }
}

/// Dispatcher that records requests, optionally refusing them.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<DispatchRequest>>,
    offline: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose target is never connected. Requests are still recorded.
    pub fn offline() -> Self {
        Self {
            sent: Mutex::default(),
            offline: true,
        }
    }

    pub fn sent(&self) -> Vec<DispatchRequest> {
        lock(&self.sent).clone()
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&self, request: DispatchRequest) -> std::result::Result<(), DispatchError> {
        let infra_id = request.infra_id.clone();
        lock(&self.sent).push(request);
        if self.offline {
            Err(DispatchError::Offline(infra_id))
        } else {
            Ok(())
        }
    }
}

/// Experiment store kept in a map, with an optional artificial latency.
#[derive(Debug, Default)]
pub struct InMemoryExperimentStore {
    experiments: Mutex<HashMap<ExperimentFilter, Experiment>>,
    latency: Option<Duration>,
}

impl InMemoryExperimentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call first sleeps for `latency`.
    pub fn slow(latency: Duration) -> Self {
        Self {
            experiments: Mutex::default(),
            latency: Some(latency),
        }
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn not_found(filter: &ExperimentFilter) -> Error {
        StoreError::NotFound {
            experiment_id: filter.experiment_id.clone(),
            project_id: filter.project_id.clone(),
        }
        .into()
    }
}

impl ExperimentStore for InMemoryExperimentStore {
    async fn create(&self, experiment: &Experiment) -> Result<()> {
        self.pause().await;
        let mut experiments = lock(&self.experiments);
        let filter = ExperimentFilter::from(experiment);
        if experiments.contains_key(&filter) {
            return Err(StoreError::DuplicateExperiment {
                experiment_id: filter.experiment_id,
                project_id: filter.project_id,
            }
            .into());
        }
        experiments.insert(filter, experiment.clone());
        Ok(())
    }

    async fn update(
        &self,
        filter: &ExperimentFilter,
        update: &ExperimentUpdate,
        mode: UpdateMode,
    ) -> Result<()> {
        self.pause().await;
        let mut experiments = lock(&self.experiments);
        let experiment = experiments
            .get_mut(filter)
            .ok_or_else(|| Self::not_found(filter))?;
        match mode {
            UpdateMode::Append => {
                experiment.revisions.push(update.revision.clone());
                experiment.kind = update.kind;
                experiment.cron_syntax.clone_from(&update.cron_syntax);
                experiment.name.clone_from(&update.name);
                experiment.description.clone_from(&update.description);
                experiment.tags.clone_from(&update.tags);
                experiment.infra_id = update.infra_id.clone();
                experiment.is_custom = update.is_custom;
                experiment.weightages.clone_from(&update.weightages);
            }
            UpdateMode::ReplaceInPlace => {
                let revision = experiment
                    .revisions
                    .iter_mut()
                    .find(|r| r.revision_id == update.revision.revision_id)
                    .ok_or_else(|| StoreError::RevisionNotFound {
                        experiment_id: filter.experiment_id.clone(),
                        revision_id: update.revision.revision_id.clone(),
                    })?;
                revision.manifest.clone_from(&update.revision.manifest);
                revision.updated_at = update.revision.updated_at;
            }
        }
        experiment.audit.updated_at = update.updated_at;
        experiment.audit.updated_by.clone_from(&update.updated_by);
        Ok(())
    }

    async fn soft_delete(&self, filter: &ExperimentFilter, acting_user: &str) -> Result<()> {
        self.pause().await;
        let mut experiments = lock(&self.experiments);
        let experiment = experiments
            .get_mut(filter)
            .ok_or_else(|| Self::not_found(filter))?;
        experiment.audit.is_removed = true;
        experiment.audit.updated_by = acting_user.to_string();
        Ok(())
    }

    async fn get(&self, filter: &ExperimentFilter) -> Result<Option<Experiment>> {
        self.pause().await;
        Ok(lock(&self.experiments).get(filter).cloned())
    }

    async fn list(&self, project_id: &ProjectId, include_removed: bool) -> Result<Vec<Experiment>> {
        self.pause().await;
        let mut found: Vec<Experiment> = lock(&self.experiments)
            .values()
            .filter(|e| &e.project_id == project_id && (include_removed || !e.is_removed()))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.audit.created_at);
        Ok(found)
    }
}
