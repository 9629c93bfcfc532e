//! Composition root: wire adapters into the experiment service.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::dispatch::connection::InfraConnections;
use crate::adapter::outbound::sqlite::database::connection::{
    create_pool_with, run_migrations, DbPool,
};
use crate::adapter::outbound::sqlite::infra::SqliteInfraDirectory;
use crate::adapter::outbound::sqlite::probe::SqliteProbeStore;
use crate::adapter::outbound::sqlite::store::SqliteExperimentStore;
use crate::application::experiment::service::ExperimentService;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::dispatch::Dispatcher;

/// The experiment service over the SQLite adapters.
pub type SqliteExperimentService =
    ExperimentService<SqliteExperimentStore, SqliteProbeStore, SqliteInfraDirectory>;

/// Open the configured database and bring its schema up to date.
///
/// # Errors
/// Returns an error if the pool cannot be built or a migration fails.
pub fn open_database(config: &Config) -> Result<DbPool> {
    let pool = create_pool_with(
        &config.database.url,
        config.database.pool_size,
        config.database.busy_timeout(),
    )?;
    run_migrations(&pool)?;
    info!(url = %config.database.url, "Database ready");
    Ok(pool)
}

/// Long-lived components shared by inbound adapters.
pub struct Runtime {
    pub service: Arc<SqliteExperimentService>,
    pub probes: Arc<SqliteProbeStore>,
    pub infra: Arc<SqliteInfraDirectory>,
    pub connections: Arc<InfraConnections>,
}

impl Runtime {
    /// Build every component from `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn start(config: &Config) -> Result<Self> {
        let pool = open_database(config)?;

        let store = Arc::new(SqliteExperimentStore::new(pool.clone()));
        let probes = Arc::new(SqliteProbeStore::new(pool.clone()));
        let infra = Arc::new(SqliteInfraDirectory::new(pool));
        let service = ExperimentService::new(store, Arc::clone(&probes), Arc::clone(&infra))
            .with_deadline(config.service.request_timeout());
        let connections = Arc::new(InfraConnections::new(config.dispatch.channel_capacity));

        info!(
            deadline_ms = config.service.request_timeout_ms,
            channel_capacity = config.dispatch.channel_capacity,
            "Runtime started"
        );
        Ok(Self {
            service: Arc::new(service),
            probes,
            infra,
            connections,
        })
    }

    /// Dispatch channel backed by the live infra connections.
    #[must_use]
    pub fn dispatcher(&self) -> &dyn Dispatcher {
        self.connections.as_ref()
    }

    /// Disconnect every infra agent.
    pub fn shutdown(&self) {
        self.connections.close_all();
        info!("Runtime stopped");
    }
}
