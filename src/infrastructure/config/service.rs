//! Database, service and dispatch settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::outbound::dispatch::connection::DEFAULT_CHANNEL_CAPACITY;
use crate::adapter::outbound::sqlite::database::connection::{
    DEFAULT_BUSY_TIMEOUT, DEFAULT_POOL_SIZE,
};
use crate::application::experiment::service::DEFAULT_DEADLINE;

/// SQLite connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file.
    pub url: String,
    pub pool_size: u32,
    /// Time a writer waits on a locked database.
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "faultline.db".into(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout_ms: millis(DEFAULT_BUSY_TIMEOUT),
        }
    }
}

/// Experiment service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deadline applied to each experiment operation.
    pub request_timeout_ms: u64,
}

impl ServiceConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: millis(DEFAULT_DEADLINE),
        }
    }
}

/// Infra dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Queue depth per connected infra.
    pub channel_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
