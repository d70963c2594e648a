//! Session boundary: authentication collaborator, explicit context and the
//! per-login subscription singleton.
//!
//! The core is inert without an identity: it shows no data, opens no
//! subscription and rejects writes.

use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
    LedgerError, ResultLedger,
    catalog::Catalog,
    controller::Controller,
    projection::Projection,
    store::RecordStore,
};

/// An authenticated identity as provided by the authentication collaborator.
///
/// Any non-null identity is authorized to read and write the collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

/// Collaborator half of the auth boundary: owns the sign-in state.
pub struct Auth {
    tx: watch::Sender<Option<Identity>>,
}

impl Auth {
    #[must_use]
    pub fn new() -> (Auth, AuthWatch) {
        let (tx, rx) = watch::channel(None);
        (Auth { tx }, AuthWatch { rx })
    }

    pub fn sign_in(&self, user_id: impl Into<String>) -> Identity {
        let identity = Identity {
            user_id: user_id.into(),
        };
        let _ = self.tx.send(Some(identity.clone()));
        identity
    }

    /// Signs in with a fresh opaque identity, as walk-in terminals do.
    pub fn sign_in_anonymous(&self) -> Identity {
        self.sign_in(Uuid::new_v4().to_string())
    }

    pub fn sign_out(&self) {
        let _ = self.tx.send(None);
    }
}

/// Core half of the auth boundary: current identity plus change
/// notifications.
#[derive(Clone)]
pub struct AuthWatch {
    rx: watch::Receiver<Option<Identity>>,
}

impl AuthWatch {
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.rx.borrow().clone()
    }

    /// Waits for the next sign-in/sign-out transition. Returns `false` once
    /// the collaborator side is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}

/// Explicitly constructed context passed to controllers and projections at
/// startup, with teardown by drop. Nothing in the crate reaches for ambient
/// globals.
pub struct LedgerContext {
    store: Arc<dyn RecordStore>,
    auth: AuthWatch,
    catalog: Catalog,
    timezone: Tz,
}

impl LedgerContext {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, auth: AuthWatch, catalog: Catalog, timezone: Tz) -> Self {
        Self {
            store,
            auth,
            catalog,
            timezone,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.auth.identity()
    }

    #[must_use]
    pub fn controller(&self) -> Controller {
        Controller::new(
            Arc::clone(&self.store),
            self.catalog.clone(),
            self.auth.clone(),
        )
    }

    /// Opens the live projection for the signed-in viewer.
    pub async fn open_projection(&self) -> ResultLedger<Projection> {
        if self.auth.identity().is_none() {
            return Err(LedgerError::Auth("no active session".to_string()));
        }
        let subscription = self.store.subscribe().await?;
        Ok(Projection::new(subscription, self.timezone))
    }
}

/// Owns the at-most-one live projection per logged-in session.
///
/// `refresh` re-aligns the subscription with the auth state: opened on
/// sign-in, torn down synchronously (subscription guard drop) on sign-out
/// or identity change.
pub struct LedgerSession {
    context: LedgerContext,
    active: Option<(Identity, Projection)>,
}

impl LedgerSession {
    #[must_use]
    pub fn new(context: LedgerContext) -> Self {
        Self {
            context,
            active: None,
        }
    }

    #[must_use]
    pub fn context(&self) -> &LedgerContext {
        &self.context
    }

    #[must_use]
    pub fn projection(&self) -> Option<&Projection> {
        self.active.as_ref().map(|(_, projection)| projection)
    }

    #[must_use]
    pub fn projection_mut(&mut self) -> Option<&mut Projection> {
        self.active.as_mut().map(|(_, projection)| projection)
    }

    pub async fn refresh(&mut self) -> ResultLedger<()> {
        let current = self.context.identity();

        let unchanged = matches!(
            (&self.active, &current),
            (Some((held, _)), Some(now)) if held == now
        );
        if unchanged {
            return Ok(());
        }

        // Tear down before opening: exactly one subscription per session.
        self.active = None;

        let Some(identity) = current else {
            tracing::debug!("session signed out, subscription released");
            return Ok(());
        };

        let projection = self.context.open_projection().await?;
        tracing::debug!(user_id = %identity.user_id, "session subscription opened");
        self.active = Some((identity, projection));
        Ok(())
    }
}
