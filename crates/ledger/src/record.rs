//! Ledger record primitives.
//!
//! A `Transaction` is a single cash entry. Records are immutable once
//! persisted; the only mutation the system knows is wholesale deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money, ResultLedger};

/// A persisted cash entry, as delivered by a store snapshot.
///
/// `id` and `created_at` are assigned by the store at write time and never
/// change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub client_name: String,
    pub artist: String,
    pub service: String,
    pub payment_method: String,
    pub value: Money,
    pub obs: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

/// A validated entry waiting to be appended.
///
/// The store fills in `id` and `created_at`; everything else travels as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub client_name: String,
    pub artist: String,
    pub service: String,
    pub payment_method: String,
    pub value: Money,
    pub obs: Option<String>,
    pub user_id: String,
}

impl NewTransaction {
    pub fn new(
        client_name: String,
        artist: String,
        service: String,
        payment_method: String,
        value: Money,
        obs: Option<String>,
        user_id: String,
    ) -> ResultLedger<Self> {
        if !value.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "value must be > 0".to_string(),
            ));
        }
        Ok(Self {
            client_name,
            artist,
            service,
            payment_method,
            value,
            obs,
            user_id,
        })
    }

    /// Materializes the record with the store-assigned identity and clock.
    #[must_use]
    pub fn into_transaction(self, id: Uuid, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            client_name: self.client_name,
            artist: self.artist,
            service: self.service,
            payment_method: self.payment_method,
            value: self.value,
            obs: self.obs,
            created_at,
            user_id: self.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(client: &str, value: i64) -> ResultLedger<NewTransaction> {
        NewTransaction::new(
            client.to_string(),
            "Jhully".to_string(),
            "Tatuagem".to_string(),
            "Pix".to_string(),
            Money::new(value),
            None,
            "op".to_string(),
        )
    }

    #[test]
    fn rejects_non_positive_value() {
        assert!(draft("Ana", 0).is_err());
        assert!(draft("Ana", -100).is_err());
    }

    #[test]
    fn materializes_with_store_identity() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let tx = draft("Ana", 150_000).unwrap().into_transaction(id, now);
        assert_eq!(tx.id, id);
        assert_eq!(tx.created_at, now);
        assert_eq!(tx.value, Money::new(150_000));
    }
}
