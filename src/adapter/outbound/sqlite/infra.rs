//! SQLite-backed infra directory.

use diesel::prelude::*;

use super::database::connection::DbPool;
use super::database::model::InfraRow;
use super::database::schema::infras;
use crate::domain::id::InfraId;
use crate::domain::infra::Infra;
use crate::error::{Error, Result, StoreError};
use crate::port::outbound::infra::InfraDirectory;

/// Registered infrastructures, keyed by infra ID.
#[derive(Clone)]
pub struct SqliteInfraDirectory {
    pool: DbPool,
}

impl SqliteInfraDirectory {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert or replace an infra registration.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub fn register(&self, infra: &Infra) -> Result<()> {
        let row = InfraRow {
            infra_id: infra.infra_id.to_string(),
            project_id: infra.project_id.to_string(),
            name: infra.name.clone(),
            is_active: infra.is_active,
        };
        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        diesel::insert_into(infras::table)
            .values(&row)
            .on_conflict(infras::infra_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }
}

impl InfraDirectory for SqliteInfraDirectory {
    async fn get_infra(&self, infra_id: &InfraId) -> Result<Option<Infra>> {
        let mut conn = self.pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        let row: Option<InfraRow> = infras::table
            .find(infra_id.as_str())
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;

        Ok(row.map(|r| Infra {
            infra_id: r.infra_id.into(),
            project_id: r.project_id.into(),
            name: r.name,
            is_active: r.is_active,
        }))
    }
}
