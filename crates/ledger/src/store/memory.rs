//! In-process reference implementation of the store contract.
//!
//! Useful for tests and demos: same observable behavior as the durable
//! store (store-assigned ids and timestamps, full-snapshot push on every
//! change), with the collection held in memory.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    LedgerError, ResultLedger,
    record::{NewTransaction, Transaction},
};

use super::{DEFAULT_TENANT, RecordStore, StoreClock, StoreEvent, SubscriberHub, Subscription};

pub struct MemoryStore {
    tenant: String,
    rows: Mutex<Vec<Transaction>>,
    hub: Arc<SubscriberHub>,
    clock: StoreClock,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::for_tenant(DEFAULT_TENANT)
    }

    #[must_use]
    pub fn for_tenant(tenant: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            rows: Mutex::new(Vec::new()),
            hub: SubscriberHub::new(),
            clock: StoreClock::new(),
        }
    }

    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    fn lock_rows(&self) -> MutexGuard<'_, Vec<Transaction>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Vec<Transaction> {
        let mut rows = self.lock_rows().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn append(&self, record: NewTransaction) -> ResultLedger<Uuid> {
        let tx = record.into_transaction(Uuid::new_v4(), self.clock.next());
        let id = tx.id;
        self.lock_rows().push(tx);
        tracing::debug!(tenant = %self.tenant, %id, "record appended");
        self.hub.broadcast(StoreEvent::Snapshot(self.snapshot()));
        Ok(id)
    }

    async fn remove(&self, id: Uuid) -> ResultLedger<()> {
        {
            let mut rows = self.lock_rows();
            let position = rows
                .iter()
                .position(|tx| tx.id == id)
                .ok_or_else(|| LedgerError::KeyNotFound(id.to_string()))?;
            rows.remove(position);
        }
        tracing::debug!(tenant = %self.tenant, %id, "record removed");
        self.hub.broadcast(StoreEvent::Snapshot(self.snapshot()));
        Ok(())
    }

    async fn subscribe(&self) -> ResultLedger<Subscription> {
        Ok(self.hub.subscribe(StoreEvent::Snapshot(self.snapshot())))
    }
}
