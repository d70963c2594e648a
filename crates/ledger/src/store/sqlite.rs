//! Durable store over SQLite via sea-orm.
//!
//! Every committed write re-reads the ordered collection and pushes the
//! fresh snapshot to all live subscriptions, so concurrent viewers converge
//! on the same list without diff tracking.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    LedgerError, ResultLedger,
    record::{NewTransaction, Transaction},
};

use super::{DEFAULT_TENANT, RecordStore, StoreClock, StoreEvent, SubscriberHub, Subscription, records};

pub struct SqliteStore {
    tenant: String,
    database: DatabaseConnection,
    hub: Arc<SubscriberHub>,
    clock: StoreClock,
}

impl SqliteStore {
    #[must_use]
    pub fn new(database: DatabaseConnection) -> Self {
        Self::for_tenant(database, DEFAULT_TENANT)
    }

    #[must_use]
    pub fn for_tenant(database: DatabaseConnection, tenant: &str) -> Self {
        Self {
            tenant: tenant.to_string(),
            database,
            hub: SubscriberHub::new(),
            clock: StoreClock::new(),
        }
    }

    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    async fn load_snapshot(&self) -> ResultLedger<Vec<Transaction>> {
        let models = records::Entity::find()
            .filter(records::Column::Tenant.eq(self.tenant.clone()))
            .order_by_desc(records::Column::CreatedAt)
            .all(&self.database)
            .await?;

        models.into_iter().map(Transaction::try_from).collect()
    }

    async fn push_snapshot(&self) -> ResultLedger<()> {
        let snapshot = self.load_snapshot().await?;
        self.hub.broadcast(StoreEvent::Snapshot(snapshot));
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn append(&self, record: NewTransaction) -> ResultLedger<Uuid> {
        let tx = record.into_transaction(Uuid::new_v4(), self.clock.next());
        let id = tx.id;

        records::active_model(&self.tenant, &tx)
            .insert(&self.database)
            .await?;
        tracing::debug!(tenant = %self.tenant, %id, "record appended");

        self.push_snapshot().await?;
        Ok(id)
    }

    async fn remove(&self, id: Uuid) -> ResultLedger<()> {
        let result = records::Entity::delete_many()
            .filter(records::Column::Id.eq(id.to_string()))
            .filter(records::Column::Tenant.eq(self.tenant.clone()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::KeyNotFound(id.to_string()));
        }
        tracing::debug!(tenant = %self.tenant, %id, "record removed");

        self.push_snapshot().await?;
        Ok(())
    }

    async fn subscribe(&self) -> ResultLedger<Subscription> {
        let snapshot = self
            .load_snapshot()
            .await
            .map_err(|err| LedgerError::Subscription(err.to_string()))?;
        Ok(self.hub.subscribe(StoreEvent::Snapshot(snapshot)))
    }
}
