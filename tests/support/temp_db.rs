//! Scratch SQLite databases for integration tests.

use std::time::Duration;

use diesel::prelude::*;
use faultline::adapter::outbound::sqlite::database::connection::{
    create_pool_with, run_migrations, DbPool,
};
use tempfile::TempDir;

/// A migrated database file inside its own temporary directory.
///
/// The directory, and the database with it, is removed on drop.
pub struct TempDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TempDb {
    pub fn create() -> Self {
        Self::with_pool_size(4)
    }

    pub fn with_pool_size(size: u32) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("faultline.db");
        let pool = create_pool_with(
            path.to_str().expect("utf-8 temp path"),
            size,
            Duration::from_secs(5),
        )
        .expect("create sqlite pool");
        run_migrations(&pool).expect("run migrations");

        // WAL mode improves concurrent writer behavior in tests.
        {
            let mut conn = pool.get().expect("get sqlite connection");
            diesel::sql_query("PRAGMA journal_mode=WAL")
                .execute(&mut conn)
                .expect("enable WAL mode");
        }

        Self { _dir: dir, pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run raw SQL against the database.
    pub fn execute(&self, sql: &str) {
        let mut conn = self.pool.get().expect("get sqlite connection");
        diesel::sql_query(sql)
            .execute(&mut conn)
            .unwrap_or_else(|e| panic!("failed to execute `{sql}`: {e}"));
    }
}
