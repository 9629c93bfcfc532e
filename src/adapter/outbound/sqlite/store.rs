//! SQLite experiment store implementation.
//!
//! Experiments and experiment runs live in separate tables joined only by
//! experiment ID. Revisions are an embedded JSON array on the experiment
//! row, never a table of their own.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::database::connection::DbPool;
use super::database::model::{ExperimentRow, ExperimentRunRow};
use super::database::schema::{experiment_runs, experiments};
use super::transaction;
use crate::domain::experiment::{
    Audit, Experiment, ExperimentFilter, ExperimentKind, ExperimentRun, ExperimentUpdate,
    Revision, UpdateMode,
};
use crate::domain::id::{ExperimentId, ProjectId};
use crate::error::{Error, Result, StoreError};
use crate::port::outbound::store::{ExperimentRunStore, ExperimentStore};

/// SQLite-backed experiment store.
///
/// Implements [`ExperimentStore`] and [`ExperimentRunStore`] over one
/// connection pool.
#[derive(Clone)]
pub struct SqliteExperimentStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteExperimentStore {
    /// Create a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(
        &self,
    ) -> Result<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<SqliteConnection>>>
    {
        self.pool.get().map_err(|e| Error::Connection(e.to_string()))
    }

    fn to_row(experiment: &Experiment) -> std::result::Result<ExperimentRow, StoreError> {
        Ok(ExperimentRow {
            experiment_id: experiment.experiment_id.to_string(),
            project_id: experiment.project_id.to_string(),
            infra_id: experiment.infra_id.to_string(),
            name: experiment.name.clone(),
            description: experiment.description.clone(),
            tags: encode(&experiment.tags)?,
            experiment_type: experiment.kind.to_string(),
            cron_syntax: experiment.cron_syntax.clone(),
            is_custom_experiment: experiment.is_custom,
            weightages: encode(&experiment.weightages)?,
            revisions: encode(&experiment.revisions)?,
            is_removed: experiment.audit.is_removed,
            created_at: experiment.audit.created_at,
            updated_at: experiment.audit.updated_at,
            created_by: experiment.audit.created_by.clone(),
            updated_by: experiment.audit.updated_by.clone(),
        })
    }

    fn from_row(row: ExperimentRow) -> std::result::Result<Experiment, StoreError> {
        Ok(Experiment {
            experiment_id: row.experiment_id.into(),
            project_id: row.project_id.into(),
            infra_id: row.infra_id.into(),
            name: row.name,
            description: row.description,
            tags: decode(&row.tags)?,
            kind: row
                .experiment_type
                .parse::<ExperimentKind>()
                .map_err(StoreError::Persistence)?,
            cron_syntax: row.cron_syntax,
            is_custom: row.is_custom_experiment,
            weightages: decode(&row.weightages)?,
            revisions: decode(&row.revisions)?,
            audit: Audit {
                created_at: row.created_at,
                updated_at: row.updated_at,
                created_by: row.created_by,
                updated_by: row.updated_by,
                is_removed: row.is_removed,
            },
        })
    }

    fn run_to_row(run: &ExperimentRun) -> ExperimentRunRow {
        ExperimentRunRow {
            experiment_run_id: run.experiment_run_id.to_string(),
            experiment_id: run.experiment_id.to_string(),
            project_id: run.project_id.to_string(),
            revision_id: run.revision_id.to_string(),
            phase: run.phase.clone(),
            is_removed: run.audit.is_removed,
            created_at: run.audit.created_at,
            updated_at: run.audit.updated_at,
            created_by: run.audit.created_by.clone(),
            updated_by: run.audit.updated_by.clone(),
        }
    }

    fn run_from_row(row: ExperimentRunRow) -> ExperimentRun {
        ExperimentRun {
            experiment_run_id: row.experiment_run_id.into(),
            experiment_id: row.experiment_id.into(),
            project_id: row.project_id.into(),
            revision_id: row.revision_id.into(),
            phase: row.phase,
            audit: Audit {
                created_at: row.created_at,
                updated_at: row.updated_at,
                created_by: row.created_by,
                updated_by: row.updated_by,
                is_removed: row.is_removed,
            },
        }
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> std::result::Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::Persistence(e.to_string()))
}

fn decode<T: DeserializeOwned>(text: &str) -> std::result::Result<T, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::Persistence(e.to_string()))
}

fn not_found(filter: &ExperimentFilter) -> StoreError {
    StoreError::NotFound {
        experiment_id: filter.experiment_id.clone(),
        project_id: filter.project_id.clone(),
    }
}

/// Read-modify-write of one experiment row.
fn apply_update(
    conn: &mut SqliteConnection,
    filter: &ExperimentFilter,
    update: &ExperimentUpdate,
    mode: UpdateMode,
) -> std::result::Result<(), StoreError> {
    let key = (filter.experiment_id.as_str(), filter.project_id.as_str());
    let row: ExperimentRow = experiments::table
        .find(key)
        .first(conn)
        .optional()?
        .ok_or_else(|| not_found(filter))?;
    let mut revisions: Vec<Revision> = decode(&row.revisions)?;

    match mode {
        UpdateMode::Append => {
            revisions.push(update.revision.clone());
            diesel::update(experiments::table.find(key))
                .set((
                    experiments::experiment_type.eq(update.kind.as_str()),
                    experiments::cron_syntax.eq(&update.cron_syntax),
                    experiments::name.eq(&update.name),
                    experiments::description.eq(&update.description),
                    experiments::tags.eq(encode(&update.tags)?),
                    experiments::infra_id.eq(update.infra_id.as_str()),
                    experiments::is_custom_experiment.eq(update.is_custom),
                    experiments::weightages.eq(encode(&update.weightages)?),
                    experiments::revisions.eq(encode(&revisions)?),
                    experiments::updated_at.eq(update.updated_at),
                    experiments::updated_by.eq(&update.updated_by),
                ))
                .execute(conn)?;
        }
        UpdateMode::ReplaceInPlace => {
            let revision = revisions
                .iter_mut()
                .find(|r| r.revision_id == update.revision.revision_id)
                .ok_or_else(|| StoreError::RevisionNotFound {
                    experiment_id: filter.experiment_id.clone(),
                    revision_id: update.revision.revision_id.clone(),
                })?;
            revision.manifest.clone_from(&update.revision.manifest);
            revision.updated_at = update.revision.updated_at;
            diesel::update(experiments::table.find(key))
                .set((
                    experiments::revisions.eq(encode(&revisions)?),
                    experiments::updated_at.eq(update.updated_at),
                    experiments::updated_by.eq(&update.updated_by),
                ))
                .execute(conn)?;
        }
    }
    Ok(())
}

impl ExperimentStore for SqliteExperimentStore {
    async fn create(&self, experiment: &Experiment) -> Result<()> {
        let row = Self::to_row(experiment)?;
        let mut conn = self.conn()?;

        diesel::insert_into(experiments::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::DuplicateExperiment {
                        experiment_id: experiment.experiment_id.clone(),
                        project_id: experiment.project_id.clone(),
                    }
                }
                other => other.into(),
            })?;

        debug!(experiment_id = %experiment.experiment_id, "Experiment row inserted");
        Ok(())
    }

    async fn update(
        &self,
        filter: &ExperimentFilter,
        update: &ExperimentUpdate,
        mode: UpdateMode,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        conn.immediate_transaction(|conn| apply_update(conn, filter, update, mode))?;
        debug!(
            experiment_id = %filter.experiment_id,
            revision_id = %update.revision.revision_id,
            mode = ?mode,
            "Experiment row updated"
        );
        Ok(())
    }

    async fn soft_delete(&self, filter: &ExperimentFilter, acting_user: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let now = Utc::now().timestamp_millis();
        let key = (filter.experiment_id.as_str(), filter.project_id.as_str());

        transaction::run(&mut conn, |conn| {
            let updated = diesel::update(experiments::table.find(key))
                .set((
                    experiments::is_removed.eq(true),
                    experiments::updated_at.eq(now),
                    experiments::updated_by.eq(acting_user),
                ))
                .execute(conn)?;
            if updated == 0 {
                return Err(not_found(filter));
            }

            let runs = diesel::update(
                experiment_runs::table
                    .filter(experiment_runs::experiment_id.eq(filter.experiment_id.as_str())),
            )
            .set((
                experiment_runs::is_removed.eq(true),
                experiment_runs::updated_at.eq(now),
                experiment_runs::updated_by.eq(acting_user),
            ))
            .execute(conn)?;
            debug!(experiment_id = %filter.experiment_id, runs, "Experiment runs removed");
            Ok(())
        })?;
        Ok(())
    }

    async fn get(&self, filter: &ExperimentFilter) -> Result<Option<Experiment>> {
        let mut conn = self.conn()?;
        let row: Option<ExperimentRow> = experiments::table
            .find((filter.experiment_id.as_str(), filter.project_id.as_str()))
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;

        Ok(row.map(Self::from_row).transpose()?)
    }

    async fn list(&self, project_id: &ProjectId, include_removed: bool) -> Result<Vec<Experiment>> {
        let mut conn = self.conn()?;
        let mut query = experiments::table
            .filter(experiments::project_id.eq(project_id.as_str()))
            .order(experiments::created_at.asc())
            .into_boxed();
        if !include_removed {
            query = query.filter(experiments::is_removed.eq(false));
        }
        let rows: Vec<ExperimentRow> = query.load(&mut conn).map_err(StoreError::from)?;

        Ok(rows
            .into_iter()
            .map(Self::from_row)
            .collect::<std::result::Result<_, _>>()?)
    }
}

impl ExperimentRunStore for SqliteExperimentStore {
    async fn record_run(&self, run: &ExperimentRun) -> Result<()> {
        let row = Self::run_to_row(run);
        let mut conn = self.conn()?;
        diesel::insert_into(experiment_runs::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn list_runs(
        &self,
        experiment_id: &ExperimentId,
        include_removed: bool,
    ) -> Result<Vec<ExperimentRun>> {
        let mut conn = self.conn()?;
        let mut query = experiment_runs::table
            .filter(experiment_runs::experiment_id.eq(experiment_id.as_str()))
            .order(experiment_runs::created_at.asc())
            .into_boxed();
        if !include_removed {
            query = query.filter(experiment_runs::is_removed.eq(false));
        }
        let rows: Vec<ExperimentRunRow> = query.load(&mut conn).map_err(StoreError::from)?;

        Ok(rows.into_iter().map(Self::run_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{
        create_pool_with, run_migrations, DEFAULT_BUSY_TIMEOUT,
    };
    use crate::domain::id::{ExperimentRunId, InfraId, RevisionId};
    use crate::domain::weightage::Weightage;

    fn setup_store() -> SqliteExperimentStore {
        let pool = create_pool_with(":memory:", 1, DEFAULT_BUSY_TIMEOUT).unwrap();
        run_migrations(&pool).unwrap();
        SqliteExperimentStore::new(pool)
    }

    fn revision(id: &str, manifest: &str) -> Revision {
        Revision {
            revision_id: RevisionId::new(id),
            manifest: manifest.into(),
            updated_at: 1,
            weightages: vec![Weightage::new("pod-delete", 10)],
        }
    }

    fn experiment(id: &str) -> Experiment {
        Experiment {
            experiment_id: ExperimentId::new(id),
            project_id: ProjectId::new("proj"),
            infra_id: InfraId::new("infra"),
            name: "nightly".into(),
            description: "pod chaos".into(),
            tags: vec!["sre".into()],
            kind: ExperimentKind::Cron,
            cron_syntax: "0 2 * * *".into(),
            is_custom: true,
            weightages: vec![Weightage::new("pod-delete", 10)],
            revisions: vec![revision("r1", "{\"v\":1}")],
            audit: Audit::created("alice", 1),
        }
    }

    fn update(revision_id: &str, manifest: &str) -> ExperimentUpdate {
        ExperimentUpdate {
            kind: ExperimentKind::Cron,
            cron_syntax: "0 3 * * *".into(),
            name: "nightly-v2".into(),
            description: "pod chaos".into(),
            tags: vec![],
            infra_id: InfraId::new("infra"),
            is_custom: true,
            weightages: vec![Weightage::new("pod-delete", 5)],
            revision: revision(revision_id, manifest),
            updated_by: "bob".into(),
            updated_at: 2,
        }
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let store = setup_store();
        let original = experiment("e1");

        store.create(&original).await.unwrap();
        let loaded = store
            .get(&ExperimentFilter::from(&original))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = setup_store();
        store.create(&experiment("e1")).await.unwrap();

        let err = store.create(&experiment("e1")).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Store(StoreError::DuplicateExperiment { .. })
        ));
    }

    #[tokio::test]
    async fn same_id_in_another_project_is_allowed() {
        let store = setup_store();
        store.create(&experiment("e1")).await.unwrap();
        let mut other = experiment("e1");
        other.project_id = ProjectId::new("other");

        store.create(&other).await.unwrap();
    }

    #[tokio::test]
    async fn append_pushes_revision_and_refreshes_fields() {
        let store = setup_store();
        let original = experiment("e1");
        store.create(&original).await.unwrap();
        let filter = ExperimentFilter::from(&original);

        store
            .update(&filter, &update("r2", "{\"v\":2}"), UpdateMode::Append)
            .await
            .unwrap();

        let loaded = store.get(&filter).await.unwrap().unwrap();
        assert_eq!(loaded.revisions.len(), 2);
        assert_eq!(loaded.latest_revision().unwrap().revision_id.as_str(), "r2");
        assert_eq!(loaded.name, "nightly-v2");
        assert_eq!(loaded.cron_syntax, "0 3 * * *");
        assert_eq!(loaded.audit.updated_by, "bob");
        assert_eq!(loaded.audit.created_by, "alice");
    }

    #[tokio::test]
    async fn replace_in_place_keeps_identity_and_other_fields() {
        let store = setup_store();
        let original = experiment("e1");
        store.create(&original).await.unwrap();
        let filter = ExperimentFilter::from(&original);

        store
            .update(&filter, &update("r1", "{\"suspend\":true}"), UpdateMode::ReplaceInPlace)
            .await
            .unwrap();

        let loaded = store.get(&filter).await.unwrap().unwrap();
        assert_eq!(loaded.revisions.len(), 1);
        assert_eq!(loaded.revisions[0].manifest, "{\"suspend\":true}");
        assert_eq!(loaded.revisions[0].updated_at, 2);
        assert_eq!(loaded.name, "nightly");
        assert_eq!(loaded.cron_syntax, "0 2 * * *");
        assert_eq!(loaded.audit.updated_by, "bob");
    }

    #[tokio::test]
    async fn replace_in_place_with_unknown_revision_is_not_found() {
        let store = setup_store();
        let original = experiment("e1");
        store.create(&original).await.unwrap();
        let filter = ExperimentFilter::from(&original);

        let err = store
            .update(&filter, &update("r9", "{}"), UpdateMode::ReplaceInPlace)
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(store.get(&filter).await.unwrap().unwrap(), original);
    }

    #[tokio::test]
    async fn update_of_missing_experiment_is_not_found() {
        let store = setup_store();
        let filter = ExperimentFilter::new(ExperimentId::new("ghost"), ProjectId::new("proj"));

        let err = store
            .update(&filter, &update("r2", "{}"), UpdateMode::Append)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn soft_delete_marks_experiment_and_runs() {
        let store = setup_store();
        let original = experiment("e1");
        store.create(&original).await.unwrap();
        for _ in 0..2 {
            store
                .record_run(&ExperimentRun {
                    experiment_run_id: ExperimentRunId::generate(),
                    experiment_id: original.experiment_id.clone(),
                    project_id: original.project_id.clone(),
                    revision_id: RevisionId::new("r1"),
                    phase: "Completed".into(),
                    audit: Audit::created("alice", 1),
                })
                .await
                .unwrap();
        }
        let filter = ExperimentFilter::from(&original);

        store.soft_delete(&filter, "carol").await.unwrap();

        let loaded = store.get(&filter).await.unwrap().unwrap();
        assert!(loaded.is_removed());
        assert_eq!(loaded.audit.updated_by, "carol");
        assert!(store.list(&original.project_id, false).await.unwrap().is_empty());
        assert_eq!(store.list(&original.project_id, true).await.unwrap().len(), 1);
        assert!(store
            .list_runs(&original.experiment_id, false)
            .await
            .unwrap()
            .is_empty());
        let runs = store.list_runs(&original.experiment_id, true).await.unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|r| r.audit.is_removed));
    }

    #[tokio::test]
    async fn soft_delete_of_missing_experiment_is_not_found() {
        let store = setup_store();
        let filter = ExperimentFilter::new(ExperimentId::new("ghost"), ProjectId::new("proj"));

        let err = store.soft_delete(&filter, "carol").await.unwrap_err();

        assert!(err.is_not_found());
    }
}
