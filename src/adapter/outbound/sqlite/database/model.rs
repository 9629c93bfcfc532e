//! Database model types for Diesel ORM.
//!
//! List-valued fields (tags, weightages, revisions) are stored as JSON text
//! inside their owning row.

use diesel::prelude::*;

use super::schema::{experiment_runs, experiments, infras, probes};

/// Database row for an experiment, revisions embedded.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = experiments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExperimentRow {
    pub experiment_id: String,
    pub project_id: String,
    pub infra_id: String,
    pub name: String,
    pub description: String,
    pub tags: String,
    pub experiment_type: String,
    pub cron_syntax: String,
    pub is_custom_experiment: bool,
    pub weightages: String,
    pub revisions: String,
    pub is_removed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: String,
    pub updated_by: String,
}

/// Database row for an experiment run.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = experiment_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExperimentRunRow {
    pub experiment_run_id: String,
    pub experiment_id: String,
    pub project_id: String,
    pub revision_id: String,
    pub phase: String,
    pub is_removed: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: String,
    pub updated_by: String,
}

/// Database row for a provisioned probe.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = probes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProbeRow {
    pub probe_id: String,
    pub project_id: String,
    pub name: String,
    pub probe_type: String,
    /// JSON-encoded creation request.
    pub request: String,
    pub created_at: i64,
}

/// Database row for a registered infra.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = infras)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InfraRow {
    pub infra_id: String,
    pub project_id: String,
    pub name: String,
    pub is_active: bool,
}
