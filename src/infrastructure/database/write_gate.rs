//! Serialization of write transactions
//!
//! SQLite admits a single writer. A deferred transaction that reads and then
//! writes needs a lock upgrade, and two of them upgrading at once fail with
//! `database is locked` instead of waiting on each other. Every repository
//! write in this process passes through one [`WriteGate`], so at most one
//! write transaction is open per process. Plain reads stay concurrent.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::DomainResult;

/// Held for the lifetime of a write
pub type WriteGuard = OwnedMutexGuard<()>;

#[derive(Clone, Default)]
pub struct WriteGate {
    lock: Arc<Mutex<()>>,
}

impl WriteGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the gate, then open a transaction.
    ///
    /// Bind the result as `let (_write, txn) = ...` and finish the
    /// transaction with [`commit_or_rollback`] while the guard is alive.
    pub async fn begin(
        &self,
        db: &DatabaseConnection,
    ) -> Result<(WriteGuard, DatabaseTransaction), DbErr> {
        let guard = self.hold().await;
        let txn = db.begin().await?;
        Ok((guard, txn))
    }

    /// Wait for the gate without opening a transaction, for single statement writes.
    pub async fn hold(&self) -> WriteGuard {
        self.lock.clone().lock_owned().await
    }
}

/// Commit on success, roll back on failure.
///
/// The rollback runs before the caller releases the gate, so the next
/// writer never finds a lock left behind by an abandoned transaction.
pub async fn commit_or_rollback<T>(
    txn: DatabaseTransaction,
    result: DomainResult<T>,
) -> DomainResult<T> {
    match result {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(e) => {
            txn.rollback().await?;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_writer_waits_for_the_first() {
        let gate = WriteGate::new();
        let first = gate.hold().await;

        let waiting = gate.clone();
        let second = tokio::spawn(async move {
            let _guard = waiting.hold().await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), second)
            .await
            .unwrap()
            .unwrap();
    }
}
