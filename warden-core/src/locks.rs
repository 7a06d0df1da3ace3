use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rst_common::with_tokio::tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// `KeyedLock` hands out one async mutex per key, used to serialize the read-modify-write
/// cycles that must not interleave for the same profile or wallet.
///
/// A key only lives in the map while someone holds or waits for it.
#[derive(Clone, Default)]
pub struct KeyedLock {
    slots: Slots,
}

/// `KeyGuard` releases its key on drop and removes the slot when nobody else holds it
pub struct KeyGuard {
    key: String,
    slots: Slots,
    slot: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // clones are only taken under the map lock, two references left means the map
        // entry and this guard
        let idle = slots
            .get(&self.key)
            .map(|current| {
                Arc::ptr_eq(current, &self.slot) && Arc::strong_count(&self.slot) == 2
            })
            .unwrap_or(false);

        if idle {
            let _ = slots.remove(&self.key);
        }
    }
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn guard(&self, key: &str, slot: Arc<AsyncMutex<()>>, guard: OwnedMutexGuard<()>) -> KeyGuard {
        KeyGuard {
            key: key.to_string(),
            slots: self.slots.clone(),
            slot,
            guard: Some(guard),
        }
    }

    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = self.slot(key);
        let guard = slot.clone().lock_owned().await;
        self.guard(key, slot, guard)
    }

    /// `try_lock` returns `None` while another holder owns the key
    pub fn try_lock(&self, key: &str) -> Option<KeyGuard> {
        let slot = self.slot(key);
        let guard = slot.clone().try_lock_owned().ok()?;
        Some(self.guard(key, slot, guard))
    }

    /// number of keys currently held or waited for
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
