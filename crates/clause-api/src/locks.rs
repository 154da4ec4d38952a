//! Per-policy write serialisation.
//!
//! Two ingestions of the same policy would read the same prior revision and
//! race on archival flags, so uploads of one `(framework, title)` pair take
//! turns. Different policies never wait on each other.
//!
//! An entry lives only while a guard for its policy is held or awaited; the
//! last guard to drop removes it.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

type Key = (Uuid, String);
type Table = HashMap<Key, Arc<AsyncMutex<()>>>;

#[derive(Clone, Default)]
pub struct PolicyLocks {
  inner: Arc<Mutex<Table>>,
}

/// Exclusive access to one policy, released on drop.
pub struct PolicyGuard {
  key:   Key,
  table: Arc<Mutex<Table>>,
  guard: Option<OwnedMutexGuard<()>>,
}

impl PolicyLocks {
  /// Wait for exclusive access to the policy `title` in `framework_id`.
  pub async fn acquire(&self, framework_id: Uuid, title: &str) -> PolicyGuard {
    let key = (framework_id, title.to_owned());
    let lock = Arc::clone(self.table().entry(key.clone()).or_default());
    let guard = lock.lock_owned().await;
    PolicyGuard { key, table: Arc::clone(&self.inner), guard: Some(guard) }
  }

  /// Number of policies currently held or awaited.
  pub fn tracked(&self) -> usize { self.table().len() }

  fn table(&self) -> MutexGuard<'_, Table> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Drop for PolicyGuard {
  fn drop(&mut self) {
    // Release first so our own handle no longer counts.
    drop(self.guard.take());
    let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
    if table
      .get(&self.key)
      .is_some_and(|lock| Arc::strong_count(lock) == 1)
    {
      table.remove(&self.key);
    }
  }
}
