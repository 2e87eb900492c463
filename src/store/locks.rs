//! Striped in-process locks keyed by any hashable value.
//!
//! Keys hash onto a fixed set of async mutexes. An operation locks the
//! stripes of every key it depends on, always in ascending stripe order, so
//! two operations sharing a key never interleave and no lock cycle can form.
//! Unrelated keys may share a stripe; that only costs some parallelism.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct KeyLocks {
    stripes: Vec<Arc<Mutex<()>>>,
}

/// Held for the duration of one guarded operation.
pub struct KeyLockGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl KeyLocks {
    pub fn new(stripes: usize) -> Self {
        let stripes = (0..stripes.max(1))
            .map(|_| Arc::new(Mutex::new(())))
            .collect();
        Self { stripes }
    }

    fn stripe_of<K: Hash + ?Sized>(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    pub async fn acquire<K: Hash + ?Sized>(&self, keys: &[&K]) -> KeyLockGuard {
        let mut indices: Vec<usize> = keys.iter().map(|key| self.stripe_of(*key)).collect();
        indices.sort_unstable();
        indices.dedup();

        let mut guards = Vec::with_capacity(indices.len());
        for index in indices {
            guards.push(Arc::clone(&self.stripes[index]).lock_owned().await);
        }
        KeyLockGuard { _guards: guards }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_twice_does_not_deadlock() {
        let locks = KeyLocks::new(8);
        let _guard = locks.acquire(&["a", "a"]).await;
    }

    #[tokio::test]
    async fn overlapping_acquisitions_are_serialized() {
        let locks = Arc::new(KeyLocks::new(1));
        let guard = locks.acquire(&["a"]).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(&["b"]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn zero_stripes_still_locks() {
        let locks = KeyLocks::new(0);
        let first = locks.acquire(&[&("title", "owner")]).await;
        drop(first);
        let _second = locks.acquire(&[&("other", "owner")]).await;
    }
}
