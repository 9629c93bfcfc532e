//! SQLite-backed probe subsystem.

use chrono::Utc;
use diesel::prelude::*;
use tracing::info;

use super::database::connection::DbPool;
use super::database::model::ProbeRow;
use super::database::schema::probes;
use crate::domain::id::ProjectId;
use crate::domain::probe::{Probe, ProbeRequest};
use crate::error::{Error, Result, StoreError};
use crate::port::outbound::probe::ProbeService;

/// Persists every creation request as a new probe row.
#[derive(Clone)]
pub struct SqliteProbeStore {
    pool: DbPool,
}

impl SqliteProbeStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All probes of a project, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list(&self, project_id: &ProjectId) -> Result<Vec<Probe>> {
        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        let rows: Vec<ProbeRow> = probes::table
            .filter(probes::project_id.eq(project_id.as_str()))
            .order(probes::created_at.asc())
            .load(&mut conn)
            .map_err(StoreError::from)?;

        Ok(rows.into_iter().map(from_row).collect())
    }
}

fn from_row(row: ProbeRow) -> Probe {
    Probe {
        probe_id: row.probe_id,
        name: row.name,
        project_id: row.project_id.into(),
        probe_type: row.probe_type.into(),
    }
}

impl ProbeService for SqliteProbeStore {
    async fn add_probe(&self, request: ProbeRequest, project_id: &ProjectId) -> Result<Probe> {
        let row = ProbeRow {
            probe_id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            name: request.name.clone(),
            probe_type: request.probe_type.as_str().to_string(),
            request: serde_json::to_string(&request)?,
            created_at: Utc::now().timestamp_millis(),
        };

        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        diesel::insert_into(probes::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;

        info!(
            probe = %row.name,
            probe_type = %row.probe_type,
            project_id = %project_id,
            "Probe created"
        );
        Ok(from_row(row))
    }
}
