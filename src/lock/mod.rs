//! Named locks serializing scheduling work per tournament.
//!
//! The trait is deliberately narrow so a distributed backend (Redis,
//! Postgres advisory locks) can slot in behind the same interface as the
//! in-process [`LocalLock`].

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// How often [`LocalLock`] re-checks a contended key
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A named mutual-exclusion lock.
#[async_trait]
pub trait NamedLock: Send + Sync {
    /// Try to acquire `key`, waiting up to `timeout`. Returns `false` if the
    /// lock could not be taken in time; the caller maps that to a conflict.
    async fn acquire(&self, key: &str, timeout: Duration) -> bool;

    /// Release `key`. Releasing a key that is not held is a no-op.
    async fn release(&self, key: &str);
}

/// In-process lock over a set of held keys, acquired by polling.
#[derive(Default)]
pub struct LocalLock {
    held: Mutex<HashSet<String>>,
}

impl LocalLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_acquire(&self, key: &str) -> bool {
        self.held.lock().unwrap().insert(key.to_string())
    }
}

#[async_trait]
impl NamedLock for LocalLock {
    async fn acquire(&self, key: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_acquire(key) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL.min(timeout)).await;
        }
    }

    async fn release(&self, key: &str) {
        self.held.lock().unwrap().remove(key);
    }
}
