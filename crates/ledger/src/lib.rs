//! Caixa Ink — real-time daily cash ledger for a tattoo studio.
//!
//! The core of the system is the synchronization model: a locally entered
//! transaction becomes durable through the [`RecordStore`] contract, the
//! store pushes full ordered snapshots back to every live subscription, and
//! each viewer's [`Projection`] reduces those snapshots into the same list
//! and the same daily total.

pub use catalog::Catalog;
pub use controller::{Controller, Deletion, EntryForm, Submission};
pub use error::LedgerError;
pub use money::{Money, mask_digits};
pub use projection::{LedgerView, Projection, daily_total};
pub use record::{NewTransaction, Transaction};
pub use session::{Auth, AuthWatch, Identity, LedgerContext, LedgerSession};
pub use store::{
    DEFAULT_TENANT, MemoryStore, RecordStore, SqliteStore, StoreEvent, Subscription,
};

mod catalog;
mod controller;
mod error;
pub mod export;
mod money;
mod projection;
mod record;
mod session;
mod store;

type ResultLedger<T> = Result<T, LedgerError>;
