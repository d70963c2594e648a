//! Entry lifecycle: draft validation, submission and confirmed deletion.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use uuid::Uuid;

use crate::{
    LedgerError, ResultLedger,
    catalog::Catalog,
    money::{self, Money},
    record::NewTransaction,
    session::AuthWatch,
    store::RecordStore,
};

/// The in-progress entry form.
///
/// Artist, service and payment method survive a successful submission so
/// repeated entries for the same context stay fast; the other fields clear.
#[derive(Clone, Debug)]
pub struct EntryForm {
    pub client_name: String,
    pub artist: String,
    pub service: String,
    pub payment_method: String,
    /// Masked display amount, e.g. `1.500,00`.
    pub value: String,
    pub obs: String,
}

impl EntryForm {
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            client_name: String::new(),
            artist: String::new(),
            service: catalog.default_service.clone(),
            payment_method: catalog.default_payment_method.clone(),
            value: String::new(),
            obs: String::new(),
        }
    }

    /// Re-renders the accumulated amount keystrokes through the input mask.
    pub fn type_value(&mut self, raw: &str) {
        self.value = money::mask_digits(raw);
    }
}

/// Outcome of a submit attempt.
///
/// `Rejected` is silent by design: a missing required field or a submission
/// already in flight declines without an error, and the caller's
/// required-field affordances are the only feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    Saved(Uuid),
    Rejected,
}

/// Outcome of a delete request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deletion {
    Removed,
    Declined,
}

pub struct Controller {
    store: Arc<dyn RecordStore>,
    catalog: Catalog,
    auth: AuthWatch,
    in_flight: AtomicBool,
}

impl Controller {
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, catalog: Catalog, auth: AuthWatch) -> Self {
        Self {
            store,
            catalog,
            auth,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Validates and submits the draft.
    ///
    /// On success clears only `client_name`, `value` and `obs`. On a store
    /// failure every field is left intact for resubmission and the error is
    /// returned for the caller to surface. At most one submission is in
    /// flight per controller; re-entry is a no-op.
    pub async fn submit(&self, form: &mut EntryForm) -> ResultLedger<Submission> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return Ok(Submission::Rejected);
        };

        if form.client_name.trim().is_empty() || form.artist.trim().is_empty() {
            return Ok(Submission::Rejected);
        }
        let Ok(value) = form.value.parse::<Money>() else {
            return Ok(Submission::Rejected);
        };
        if !value.is_positive() {
            return Ok(Submission::Rejected);
        }
        if !self.catalog.has_artist(&form.artist)
            || !self.catalog.has_service(&form.service)
            || !self.catalog.has_payment_method(&form.payment_method)
        {
            return Ok(Submission::Rejected);
        }

        let identity = self
            .auth
            .identity()
            .ok_or_else(|| LedgerError::Auth("sign in before writing".to_string()))?;

        let obs = form.obs.trim();
        let record = NewTransaction::new(
            form.client_name.trim().to_string(),
            form.artist.clone(),
            form.service.clone(),
            form.payment_method.clone(),
            value,
            (!obs.is_empty()).then(|| obs.to_string()),
            identity.user_id,
        )?;

        let id = self.store.append(record).await?;
        tracing::debug!(%id, "entry recorded");

        form.client_name.clear();
        form.value.clear();
        form.obs.clear();
        Ok(Submission::Saved(id))
    }

    /// Deletes a record after the confirmation callback affirms.
    ///
    /// Declines silently when confirmation is withheld. Never removes the
    /// record from the local projection: the list changes only when the
    /// store pushes the post-deletion snapshot.
    pub async fn request_delete<F>(&self, id: Uuid, confirm: F) -> ResultLedger<Deletion>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            return Ok(Deletion::Declined);
        }
        self.store.remove(id).await?;
        tracing::debug!(%id, "entry deleted");
        Ok(Deletion::Removed)
    }
}

/// Re-entry latch released on drop, so error paths re-enable submission too.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
