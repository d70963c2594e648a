//! The module contains the errors the ledger can throw.
//!
//! Failures are converted into values at the boundary where the asynchronous
//! operation was initiated; none are allowed to escape as panics. Nothing is
//! retried automatically.
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid record: {0}")]
    Decode(String),
    #[error("Write rejected: {0}")]
    Write(String),
    #[error("Subscription failed: {0}")]
    Subscription(String),
    #[error("Not signed in: {0}")]
    Auth(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Decode(a), Self::Decode(b)) => a == b,
            (Self::Write(a), Self::Write(b)) => a == b,
            (Self::Subscription(a), Self::Subscription(b)) => a == b,
            (Self::Auth(a), Self::Auth(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
