//! Persistence model for the `transactions` collection.
//!
//! The decode step is the boundary guard: a stored row with a corrupt id,
//! a non-positive amount or a blank required field fails with
//! [`LedgerError::Decode`] instead of surfacing a half-built record.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{LedgerError, Money, record::Transaction};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tenant: String,
    pub client_name: String,
    pub artist: String,
    pub service: String,
    pub payment_method: String,
    pub value_centavos: i64,
    pub obs: Option<String>,
    pub created_at: DateTimeUtc,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(tenant: &str, tx: &Transaction) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(tx.id.to_string()),
        tenant: ActiveValue::Set(tenant.to_string()),
        client_name: ActiveValue::Set(tx.client_name.clone()),
        artist: ActiveValue::Set(tx.artist.clone()),
        service: ActiveValue::Set(tx.service.clone()),
        payment_method: ActiveValue::Set(tx.payment_method.clone()),
        value_centavos: ActiveValue::Set(tx.value.centavos()),
        obs: ActiveValue::Set(tx.obs.clone()),
        created_at: ActiveValue::Set(tx.created_at),
        user_id: ActiveValue::Set(tx.user_id.clone()),
    }
}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|_| LedgerError::Decode(format!("invalid record id: {}", model.id)))?;
        if model.client_name.trim().is_empty() {
            return Err(LedgerError::Decode(format!(
                "record {id} has no client name"
            )));
        }
        if model.artist.trim().is_empty() {
            return Err(LedgerError::Decode(format!("record {id} has no artist")));
        }
        if model.value_centavos <= 0 {
            return Err(LedgerError::Decode(format!(
                "record {id} has a non-positive value"
            )));
        }

        Ok(Self {
            id,
            client_name: model.client_name,
            artist: model.artist,
            service: model.service,
            payment_method: model.payment_method,
            value: Money::new(model.value_centavos),
            obs: model.obs,
            created_at: model.created_at,
            user_id: model.user_id,
        })
    }
}
