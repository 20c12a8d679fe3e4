//! Keyed async locks serializing read-then-write sequences on one record.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use crate::error::Result;

/// One async lock per key. Entries are created on first use.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    pub async fn acquire(&self, key: K) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock()?;
            locks.entry(key).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }

    pub fn forget(&self, key: &K) -> Result<()> {
        self.locks.lock()?.remove(key);
        Ok(())
    }
}

/// Upserts of the same (category, month) budget never overlap.
pub type BudgetLocks = KeyedLocks<(String, String)>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_waits_for_holder() {
        let locks = Arc::new(KeyedLocks::<i32>::default());
        let held = locks.acquire(1).await.unwrap();

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.acquire(1).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        // Other keys are independent
        let _other = locks.acquire(2).await.unwrap();

        drop(held);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_forget_drops_entry() {
        let locks = KeyedLocks::<i32>::default();
        drop(locks.acquire(7).await.unwrap());
        locks.forget(&7).unwrap();
        assert!(locks.locks.lock().unwrap().is_empty());
    }
}
