//! Per-client advisory locks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serializes operations on the same client name.
///
/// Only callers going through the same table are serialized; another
/// process running easy-rsa on the same PKI is not.
#[derive(Debug, Default)]
pub struct ClientLocks {
    entries: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Held while an operation on one client is in progress.
#[derive(Debug)]
pub struct ClientGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ClientLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `name`.
    pub async fn acquire(&self, name: &str) -> ClientGuard {
        let slot = {
            let mut entries = self.entries.lock();
            // Nobody holds or waits on an entry whose only reference is the table.
            entries.retain(|key, slot| key == name || Arc::strong_count(slot) > 1);
            Arc::clone(entries.entry(name.to_string()).or_default())
        };

        ClientGuard {
            _guard: slot.lock_owned().await,
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.entries.lock().len()
    }
}
