//! Persistence ports for experiments and their runs.
//!
//! Experiments and experiment runs live in two logically separate
//! collections joined only by experiment ID. Revisions are embedded in the
//! experiment record.

use std::future::Future;

use crate::domain::experiment::{
    Experiment, ExperimentFilter, ExperimentRun, ExperimentUpdate, UpdateMode,
};
use crate::domain::id::{ExperimentId, ProjectId};
use crate::error::Result;

/// Storage operations for the experiment aggregate.
pub trait ExperimentStore: Send + Sync {
    /// Insert a new experiment.
    ///
    /// Fails with `StoreError::DuplicateExperiment` if the ID already exists
    /// in the project.
    fn create(&self, experiment: &Experiment) -> impl Future<Output = Result<()>> + Send;

    /// Apply an update to the experiment matched by `filter`.
    ///
    /// [`UpdateMode::Append`] pushes `update.revision` and refreshes the
    /// top-level fields. [`UpdateMode::ReplaceInPlace`] rewrites the manifest
    /// and timestamp of the revision with the same ID and nothing else.
    fn update(
        &self,
        filter: &ExperimentFilter,
        update: &ExperimentUpdate,
        mode: UpdateMode,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Mark the experiment and all its runs removed, atomically.
    fn soft_delete(
        &self,
        filter: &ExperimentFilter,
        acting_user: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Get an experiment, removed or not.
    fn get(&self, filter: &ExperimentFilter)
        -> impl Future<Output = Result<Option<Experiment>>> + Send;

    /// List experiments of a project, optionally including removed ones.
    fn list(
        &self,
        project_id: &ProjectId,
        include_removed: bool,
    ) -> impl Future<Output = Result<Vec<Experiment>>> + Send;
}

/// Storage operations for experiment runs.
pub trait ExperimentRunStore: Send + Sync {
    /// Record a run.
    fn record_run(&self, run: &ExperimentRun) -> impl Future<Output = Result<()>> + Send;

    /// List the runs of an experiment, optionally including removed ones.
    fn list_runs(
        &self,
        experiment_id: &ExperimentId,
        include_removed: bool,
    ) -> impl Future<Output = Result<Vec<ExperimentRun>>> + Send;
}
