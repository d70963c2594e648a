use std::sync::Arc;

use chrono_tz::Tz;
use tokio::sync::Notify;
use uuid::Uuid;

use ledger::{
    Auth, Catalog, Deletion, EntryForm, LedgerContext, LedgerError, LedgerSession, MemoryStore,
    Money, NewTransaction, RecordStore, StoreEvent, Submission, Subscription,
};

const SAO_PAULO: Tz = chrono_tz::America::Sao_Paulo;

fn signed_in_context(store: Arc<dyn RecordStore>, operator: &str) -> (Auth, LedgerContext) {
    let (auth, watch) = Auth::new();
    auth.sign_in(operator);
    let context = LedgerContext::new(store, watch, Catalog::default(), SAO_PAULO);
    (auth, context)
}

fn filled_form(catalog: &Catalog) -> EntryForm {
    let mut form = EntryForm::new(catalog);
    form.client_name = "Ana".to_string();
    form.artist = "Jhully".to_string();
    form.type_value("150000");
    form
}

#[tokio::test]
async fn submit_records_and_clears_transactional_fields() {
    let store = Arc::new(MemoryStore::new());
    let (_auth, context) = signed_in_context(store, "balcao");

    let mut projection = context.open_projection().await.unwrap();
    assert!(projection.changed().await);
    assert!(!projection.view().loading);
    assert!(projection.view().transactions.is_empty());

    let controller = context.controller();
    let mut form = filled_form(context.catalog());
    assert_eq!(form.value, "1.500,00");
    form.obs = "parcelou em 10x".to_string();

    let outcome = controller.submit(&mut form).await.unwrap();
    let Submission::Saved(id) = outcome else {
        panic!("expected a saved entry, got {outcome:?}");
    };

    // Transactional fields clear, context selections survive.
    assert!(form.client_name.is_empty());
    assert!(form.value.is_empty());
    assert!(form.obs.is_empty());
    assert_eq!(form.artist, "Jhully");
    assert_eq!(form.service, "Tatuagem");
    assert_eq!(form.payment_method, "Pix");

    // The list updates only through the store push.
    assert!(projection.changed().await);
    let view = projection.view();
    assert_eq!(view.transactions.len(), 1);
    assert_eq!(view.transactions[0].id, id);
    assert_eq!(view.transactions[0].value, Money::new(150_000));
    assert_eq!(
        view.transactions[0].obs.as_deref(),
        Some("parcelou em 10x")
    );
    assert_eq!(view.transactions[0].user_id, "balcao");
    assert_eq!(view.day_total, Money::new(150_000));
}

#[tokio::test]
async fn submit_with_missing_required_fields_is_a_silent_no_op() {
    let store = Arc::new(MemoryStore::new());
    let (_auth, context) = signed_in_context(Arc::clone(&store) as Arc<dyn RecordStore>, "balcao");
    let controller = context.controller();

    let mut blank_client = filled_form(context.catalog());
    blank_client.client_name.clear();
    assert_eq!(
        controller.submit(&mut blank_client).await.unwrap(),
        Submission::Rejected
    );

    let mut blank_artist = filled_form(context.catalog());
    blank_artist.artist.clear();
    assert_eq!(
        controller.submit(&mut blank_artist).await.unwrap(),
        Submission::Rejected
    );

    let mut zero_value = filled_form(context.catalog());
    zero_value.type_value("");
    assert_eq!(
        controller.submit(&mut zero_value).await.unwrap(),
        Submission::Rejected
    );

    let mut unknown_artist = filled_form(context.catalog());
    unknown_artist.artist = "Zé".to_string();
    assert_eq!(
        controller.submit(&mut unknown_artist).await.unwrap(),
        Submission::Rejected
    );

    // No append reached the store.
    let mut subscription = store.subscribe().await.unwrap();
    let Some(StoreEvent::Snapshot(snapshot)) = subscription.next_event().await else {
        panic!("expected the initial snapshot");
    };
    assert!(snapshot.is_empty());
}

#[tokio::test]
async fn submit_without_identity_is_an_auth_error() {
    let store = Arc::new(MemoryStore::new());
    let (auth, context) = signed_in_context(store, "balcao");
    let controller = context.controller();
    auth.sign_out();

    let mut form = filled_form(context.catalog());
    let err = controller.submit(&mut form).await.unwrap_err();
    assert!(matches!(err, LedgerError::Auth(_)));
    // Fields stay intact for retry after signing back in.
    assert_eq!(form.client_name, "Ana");
    assert_eq!(form.value, "1.500,00");
}

/// Store double that rejects every write.
struct RejectingStore;

#[async_trait::async_trait]
impl RecordStore for RejectingStore {
    async fn append(&self, _record: NewTransaction) -> Result<Uuid, LedgerError> {
        Err(LedgerError::Write("permission denied".to_string()))
    }

    async fn remove(&self, _id: Uuid) -> Result<(), LedgerError> {
        Err(LedgerError::Write("permission denied".to_string()))
    }

    async fn subscribe(&self) -> Result<Subscription, LedgerError> {
        Err(LedgerError::Subscription("permission denied".to_string()))
    }
}

#[tokio::test]
async fn write_failure_surfaces_and_leaves_the_form_intact() {
    let (_auth, context) = signed_in_context(Arc::new(RejectingStore), "balcao");
    let controller = context.controller();

    let mut form = filled_form(context.catalog());
    form.obs = "sinal".to_string();

    let err = controller.submit(&mut form).await.unwrap_err();
    assert_eq!(err, LedgerError::Write("permission denied".to_string()));

    assert_eq!(form.client_name, "Ana");
    assert_eq!(form.value, "1.500,00");
    assert_eq!(form.obs, "sinal");

    // The in-flight latch released on the error path.
    let second = controller.submit(&mut form).await.unwrap_err();
    assert_eq!(second, LedgerError::Write("permission denied".to_string()));
}

/// Store double that parks appends until released, to observe the
/// in-flight window.
struct GatedStore {
    inner: MemoryStore,
    gate: Notify,
}

#[async_trait::async_trait]
impl RecordStore for GatedStore {
    async fn append(&self, record: NewTransaction) -> Result<Uuid, LedgerError> {
        self.gate.notified().await;
        self.inner.append(record).await
    }

    async fn remove(&self, id: Uuid) -> Result<(), LedgerError> {
        self.inner.remove(id).await
    }

    async fn subscribe(&self) -> Result<Subscription, LedgerError> {
        self.inner.subscribe().await
    }
}

#[tokio::test]
async fn second_submit_while_one_is_outstanding_is_a_no_op() {
    let store = Arc::new(GatedStore {
        inner: MemoryStore::new(),
        gate: Notify::new(),
    });
    let (_auth, context) = signed_in_context(Arc::clone(&store) as Arc<dyn RecordStore>, "balcao");
    let controller = Arc::new(context.controller());

    let background = Arc::clone(&controller);
    let catalog = context.catalog().clone();
    let first = tokio::spawn(async move {
        let mut form = filled_form(&catalog);
        background.submit(&mut form).await
    });

    // Let the first submission reach the parked append.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let mut form = filled_form(context.catalog());
    assert_eq!(
        controller.submit(&mut form).await.unwrap(),
        Submission::Rejected
    );

    store.gate.notify_one();
    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, Submission::Saved(_)));

    // Released: the next submission goes through.
    store.gate.notify_one();
    assert!(matches!(
        controller.submit(&mut form).await.unwrap(),
        Submission::Saved(_)
    ));
}

#[tokio::test]
async fn delete_requires_confirmation_and_is_not_idempotent() {
    let store = Arc::new(MemoryStore::new());
    let (_auth, context) = signed_in_context(Arc::clone(&store) as Arc<dyn RecordStore>, "balcao");
    let controller = context.controller();

    let mut form = filled_form(context.catalog());
    let Submission::Saved(id) = controller.submit(&mut form).await.unwrap() else {
        panic!("expected a saved entry");
    };

    let mut projection = context.open_projection().await.unwrap();
    assert!(projection.changed().await);
    assert_eq!(projection.view().transactions.len(), 1);

    // Withheld confirmation: nothing happens.
    assert_eq!(
        controller.request_delete(id, || false).await.unwrap(),
        Deletion::Declined
    );
    projection.drain();
    assert_eq!(projection.view().transactions.len(), 1);

    // Confirmed: removed, visible once the store pushes.
    assert_eq!(
        controller.request_delete(id, || true).await.unwrap(),
        Deletion::Removed
    );
    assert!(projection.changed().await);
    assert!(projection.view().transactions.is_empty());
    assert_eq!(projection.view().day_total, Money::ZERO);

    // Repeating the confirmed delete fails: the contract is not idempotent.
    let err = controller.request_delete(id, || true).await.unwrap_err();
    assert!(matches!(err, LedgerError::KeyNotFound(_)));
}

#[tokio::test]
async fn concurrent_sessions_converge_on_the_same_ordered_list() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (_auth_a, context_a) = signed_in_context(Arc::clone(&store), "balcao");
    let (_auth_b, context_b) = signed_in_context(Arc::clone(&store), "gerencia");

    let controller_a = context_a.controller();
    let controller_b = context_b.controller();

    let mut form_a = filled_form(context_a.catalog());
    let mut form_b = filled_form(context_b.catalog());
    form_b.client_name = "Bia".to_string();
    form_b.artist = "Aryan".to_string();

    let (first, second) = tokio::join!(
        controller_a.submit(&mut form_a),
        controller_b.submit(&mut form_b)
    );
    let Submission::Saved(id_a) = first.unwrap() else {
        panic!("first submission failed");
    };
    let Submission::Saved(id_b) = second.unwrap() else {
        panic!("second submission failed");
    };
    assert_ne!(id_a, id_b);

    let mut projection_a = context_a.open_projection().await.unwrap();
    let mut projection_b = context_b.open_projection().await.unwrap();
    assert!(projection_a.changed().await);
    assert!(projection_b.changed().await);

    let list_a = &projection_a.view().transactions;
    let list_b = &projection_b.view().transactions;
    assert_eq!(list_a, list_b);
    assert_eq!(list_a.len(), 2);
    // Store timestamps are strictly ordered even for near-simultaneous
    // writes, so the list order is deterministic.
    assert!(list_a[0].created_at > list_a[1].created_at);
    assert_eq!(projection_a.view().day_total, Money::new(300_000));
}

#[tokio::test]
async fn remaining_subscribers_keep_receiving_after_one_unsubscribes() {
    let store = Arc::new(MemoryStore::new());
    let (_auth, context) = signed_in_context(Arc::clone(&store) as Arc<dyn RecordStore>, "balcao");

    let dropped = store.subscribe().await.unwrap();
    let mut kept = store.subscribe().await.unwrap();
    assert!(matches!(
        kept.next_event().await,
        Some(StoreEvent::Snapshot(_))
    ));

    drop(dropped);

    let controller = context.controller();
    let mut form = filled_form(context.catalog());
    assert!(matches!(
        controller.submit(&mut form).await.unwrap(),
        Submission::Saved(_)
    ));

    let Some(StoreEvent::Snapshot(snapshot)) = kept.next_event().await else {
        panic!("kept subscription should still receive pushes");
    };
    assert_eq!(snapshot.len(), 1);
}

#[tokio::test]
async fn session_opens_and_tears_down_with_auth_transitions() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
    let (auth, watch) = Auth::new();
    let context = LedgerContext::new(store, watch, Catalog::default(), SAO_PAULO);

    let mut session = LedgerSession::new(context);

    // Inert before sign-in.
    session.refresh().await.unwrap();
    assert!(session.projection().is_none());
    assert!(session.context().open_projection().await.is_err());

    auth.sign_in("balcao");
    session.refresh().await.unwrap();
    assert!(session.projection().is_some());

    // Unchanged identity keeps the same subscription.
    session.refresh().await.unwrap();
    assert!(session.projection().is_some());

    auth.sign_out();
    session.refresh().await.unwrap();
    assert!(session.projection().is_none());
}
