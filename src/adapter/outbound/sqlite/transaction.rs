//! Scoped transactions.
//!
//! A [`TransactionScope`] owns an open transaction on a borrowed
//! connection. It ends exactly once: by [`commit`](TransactionScope::commit),
//! by [`abort`](TransactionScope::abort), or by a rollback on drop.

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::SqliteConnection;
use tracing::error;

use crate::error::StoreError;

/// An open transaction, rolled back unless committed.
pub struct TransactionScope<'a> {
    conn: &'a mut SqliteConnection,
    open: bool,
}

impl<'a> TransactionScope<'a> {
    /// Begin a transaction on `conn`.
    pub fn begin(conn: &'a mut SqliteConnection) -> Result<Self, StoreError> {
        AnsiTransactionManager::begin_transaction(&mut *conn)?;
        Ok(Self { conn, open: true })
    }

    /// Connection to run statements inside the transaction.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.conn
    }

    /// Commit. A failed commit is rolled back before returning.
    ///
    /// # Errors
    /// [`StoreError::TransactionAbort`] when that rollback also failed,
    /// [`StoreError::Persistence`] otherwise.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.open = false;
        match AnsiTransactionManager::commit_transaction(&mut *self.conn) {
            Ok(()) => Ok(()),
            Err(e @ diesel::result::Error::RollbackErrorOnCommit { .. }) => {
                error!(error = %e, "Rollback after failed commit failed");
                Err(StoreError::TransactionAbort(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Roll back.
    ///
    /// # Errors
    /// [`StoreError::TransactionAbort`] when the rollback failed; the
    /// database state is then unknown and must not be retried past.
    pub fn abort(mut self) -> Result<(), StoreError> {
        self.open = false;
        AnsiTransactionManager::rollback_transaction(&mut *self.conn).map_err(|e| {
            error!(error = %e, "Transaction abort failed");
            StoreError::TransactionAbort(e.to_string())
        })
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = AnsiTransactionManager::rollback_transaction(&mut *self.conn) {
                error!(error = %e, "Rollback of abandoned transaction failed");
            }
        }
    }
}

/// Run `body` in a transaction: commit on `Ok`, abort on `Err`.
///
/// The body's error is returned after a successful abort. A failed abort
/// takes precedence.
pub fn run<T, F>(conn: &mut SqliteConnection, body: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError>,
{
    let mut scope = TransactionScope::begin(conn)?;
    match body(scope.conn()) {
        Ok(value) => {
            scope.commit()?;
            Ok(value)
        }
        Err(e) => {
            scope.abort()?;
            Err(e)
        }
    }
}
