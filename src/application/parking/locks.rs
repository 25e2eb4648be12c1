//! Per-lot async mutexes
//!
//! Booking, release and capacity changes on the same lot run one at a time
//! inside this process. Different lots proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct LotLocks {
    locks: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

impl LotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `lot_id`; released when the guard drops.
    pub async fn lock(&self, lot_id: i32) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(lot_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop the mutex of a deleted lot
    pub fn forget(&self, lot_id: i32) {
        self.locks.remove(&lot_id);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
