//! Debounced per-entity save scheduling.
//!
//! Field edits land in memory immediately and are written to the store only
//! after a quiet period. Each entity id has at most one pending save: a new
//! `schedule` for the same id aborts the armed timer and replaces the held
//! snapshot, so a burst of keystrokes collapses into one UPDATE carrying the
//! last state. Ids never interfere with each other.
//!
//! Background write failures are logged and dropped. There is no retry; the
//! next edit to the same entity schedules a fresh write with the full row.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::db::{SqlValue, StoreHandle};

/// Quiet period used when the config does not override it.
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(500);

/// An entity that can be written back as a single statement.
pub trait Persisted: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// The full-row UPDATE for this snapshot.
    fn save_statement(&self) -> (&'static str, Vec<SqlValue>);
}

struct PendingSave<E> {
    generation: u64,
    snapshot: E,
    timer: JoinHandle<()>,
}

struct Shared<E> {
    store: Arc<dyn StoreHandle>,
    pending: Mutex<HashMap<String, PendingSave<E>>>,
    next_generation: AtomicU64,
}

impl<E: Persisted> Shared<E> {
    /// Called by a timer when it elapses. Takes the snapshot only if this
    /// timer is still the current one for `id`.
    fn take_if_current(&self, id: &str, generation: u64) -> Option<E> {
        let mut pending = self.pending.lock();
        match pending.get(id) {
            Some(entry) if entry.generation == generation => {
                pending.remove(id).map(|entry| entry.snapshot)
            }
            _ => None,
        }
    }

    async fn write(&self, snapshot: E) {
        let (sql, params) = snapshot.save_statement();
        match self.store.execute(sql, params).await {
            Ok(0) => log::debug!("Save for {} matched no row", snapshot.id()),
            Ok(_) => log::debug!("Saved {}", snapshot.id()),
            Err(e) => log::error!("Failed to save {}: {}", snapshot.id(), e),
        }
    }
}

/// Debounces writes for one entity type.
pub struct SaveScheduler<E> {
    shared: Arc<Shared<E>>,
    delay: Duration,
    runtime: Handle,
}

impl<E: Persisted> SaveScheduler<E> {
    /// Timers are spawned on `runtime`, so the scheduler can be built from
    /// outside a runtime context.
    pub fn new(store: Arc<dyn StoreHandle>, delay: Duration, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                pending: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
            }),
            delay,
            runtime,
        }
    }

    /// Arm (or re-arm) the save for `snapshot.id()` with the configured delay.
    pub fn schedule(&self, snapshot: E) {
        self.schedule_with_delay(snapshot, self.delay);
    }

    pub fn schedule_with_delay(&self, snapshot: E, delay: Duration) {
        let id = snapshot.id().to_string();
        let generation = self.shared.next_generation.fetch_add(1, Ordering::Relaxed);

        // The lock is held across spawn + insert so the timer can never see
        // the map before its own entry is in it.
        let mut pending = self.shared.pending.lock();

        let shared = Arc::clone(&self.shared);
        let timer_id = id.clone();
        let timer = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(snapshot) = shared.take_if_current(&timer_id, generation) {
                shared.write(snapshot).await;
            }
        });

        if let Some(previous) = pending.insert(
            id.clone(),
            PendingSave {
                generation,
                snapshot,
                timer,
            },
        ) {
            previous.timer.abort();
            log::trace!("Re-armed save for {}", id);
        }
    }

    /// Drop the pending save for `id`. Returns `false` if nothing was pending
    /// (including when the timer already fired).
    pub fn cancel(&self, id: &str) -> bool {
        match self.shared.pending.lock().remove(id) {
            Some(entry) => {
                entry.timer.abort();
                log::debug!("Cancelled pending save for {}", id);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.shared.pending.lock().contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.shared.pending.lock().len()
    }

    /// Write every pending snapshot now instead of waiting for its timer.
    ///
    /// Returns the number of writes attempted.
    pub async fn flush(&self) -> usize {
        let drained: Vec<E> = {
            let mut pending = self.shared.pending.lock();
            pending
                .drain()
                .map(|(_, entry)| {
                    entry.timer.abort();
                    entry.snapshot
                })
                .collect()
        };

        let count = drained.len();
        for snapshot in drained {
            self.shared.write(snapshot).await;
        }
        if count > 0 {
            log::info!("Flushed {} pending saves", count);
        }
        count
    }
}
