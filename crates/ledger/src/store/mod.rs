//! Record-store contract and implementations.
//!
//! The ledger core only needs three operations from its backing store:
//! append, delete-by-id and a live ordered subscription. Everything else
//! (replication, durability guarantees) belongs to the store behind this
//! boundary.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    ResultLedger,
    record::{NewTransaction, Transaction},
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

mod memory;
pub(crate) mod records;
mod sqlite;

/// Default application identifier under which the collection is scoped.
pub const DEFAULT_TENANT: &str = "casa-ink-prod";

/// An event pushed through a live subscription.
#[derive(Clone, Debug)]
pub enum StoreEvent {
    /// The complete current collection, ordered by `created_at` descending.
    /// Always the full state, never a delta.
    Snapshot(Vec<Transaction>),
    /// The live channel failed (e.g. permission revoked). The viewer keeps
    /// its last-known list; no snapshot follows on this subscription.
    Lost(String),
}

/// The narrow interface the ledger needs from a persistent, multi-writer,
/// real-time-subscribable record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Durably persists a new record, assigning its id and `created_at` from
    /// the store clock.
    ///
    /// Callers must not assume the record is visible before the store pushes
    /// it back through the subscriptions.
    async fn append(&self, record: NewTransaction) -> ResultLedger<Uuid>;

    /// Deletes a record by id.
    ///
    /// Not idempotent: removing an id that does not exist fails with
    /// [`LedgerError::KeyNotFound`]. Callers gate repeats with user
    /// confirmation, not automatic retry.
    ///
    /// [`LedgerError::KeyNotFound`]: crate::LedgerError::KeyNotFound
    async fn remove(&self, id: Uuid) -> ResultLedger<()>;

    /// Opens a live subscription to the full ordered collection.
    ///
    /// The first event is the current snapshot; a fresh full snapshot
    /// follows every insert or delete anywhere. Concurrent subscriptions
    /// each independently receive every snapshot.
    async fn subscribe(&self) -> ResultLedger<Subscription>;
}

/// A live feed of [`StoreEvent`]s.
///
/// Dropping the subscription unsubscribes synchronously: the store forgets
/// the channel and no further event can be observed.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<StoreEvent>,
    _guard: SubscriptionGuard,
}

impl Subscription {
    /// Waits for the next event. `None` once the store closed the feed.
    pub async fn next_event(&mut self) -> Option<StoreEvent> {
        self.events.recv().await
    }

    /// Returns an already-delivered event without waiting, if any.
    pub fn try_next_event(&mut self) -> Option<StoreEvent> {
        self.events.try_recv().ok()
    }
}

#[derive(Debug)]
struct SubscriptionGuard {
    hub: Arc<SubscriberHub>,
    id: u64,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.hub.lock_senders().remove(&self.id);
    }
}

/// Fan-out of full snapshots to every live subscription.
///
/// Shared by the store implementations; per-subscriber channels keep each
/// viewer's events serialized, so a stale snapshot can never be applied
/// after a newer one.
#[derive(Debug)]
pub(crate) struct SubscriberHub {
    next_id: AtomicU64,
    senders: Mutex<HashMap<u64, mpsc::UnboundedSender<StoreEvent>>>,
}

impl SubscriberHub {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(0),
            senders: Mutex::new(HashMap::new()),
        })
    }

    pub(crate) fn subscribe(self: &Arc<Self>, initial: StoreEvent) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let _ = tx.send(initial);
        self.lock_senders().insert(id, tx);
        Subscription {
            events: rx,
            _guard: SubscriptionGuard {
                hub: Arc::clone(self),
                id,
            },
        }
    }

    pub(crate) fn broadcast(&self, event: StoreEvent) {
        self.lock_senders()
            .retain(|_, tx| tx.send(event.clone()).is_ok());
    }

    fn lock_senders(&self) -> MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<StoreEvent>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The write clock: assigns `created_at` timestamps that are strictly
/// monotonic with respect to receipt order, so near-simultaneous writes are
/// deterministically ordered even when the wall clock stalls.
pub(crate) struct StoreClock {
    last: Mutex<DateTime<Utc>>,
}

impl StoreClock {
    pub(crate) fn new() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    pub(crate) fn next(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let mut now = Utc::now();
        if now <= *last {
            now = *last + TimeDelta::milliseconds(1);
        }
        *last = now;
        now
    }
}
