use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{AppError, AppResult};

/// Per-restaurant mutual exclusion for multi-step rule checks, so that
/// concurrent membership or order requests on one restaurant cannot
/// interleave between their checks and their writes.
#[derive(Clone, Default)]
pub struct RestaurantLocks {
    locks: Arc<Mutex<HashMap<u64, Arc<AsyncMutex<()>>>>>,
}

impl RestaurantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, restaurant_id: u64) -> AppResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| AppError::StoreError("restaurant lock table poisoned".to_string()))?;
            locks.entry(restaurant_id).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }

    /// Drops the lock entry of a deleted restaurant.
    pub fn forget(&self, restaurant_id: u64) {
        if let Ok(mut locks) = self.locks.lock() {
            locks.remove(&restaurant_id);
        }
    }
}
