//! The locally held, derived view of the remote collection.
//!
//! Each snapshot is a full replacement: the reducer never patches, so the
//! visible list always reflects the most recently delivered state and a
//! stale snapshot cannot survive a newer one.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::{
    Money,
    record::Transaction,
    store::{StoreEvent, Subscription},
};

/// Derived state updated atomically per store event: the ordered list, the
/// loading flag and today's total.
///
/// `loading` is true until the first snapshot arrives and false forever
/// after for the lifetime of the subscription, including after a lost
/// channel (the last-known list stays visible).
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerView {
    pub transactions: Vec<Transaction>,
    pub loading: bool,
    pub day_total: Money,
}

impl Default for LedgerView {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerView {
    /// Empty view in the loading state, as held before any subscription
    /// has delivered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            loading: true,
            day_total: Money::ZERO,
        }
    }

    /// Folds one store event into the view.
    ///
    /// Pure over (state, event, today): no store access, so the reducer is
    /// unit-testable without a live subscription. The daily total is
    /// recomputed from scratch on every snapshot.
    pub fn apply(&mut self, event: StoreEvent, today: NaiveDate, timezone: Tz) {
        match event {
            StoreEvent::Snapshot(mut snapshot) => {
                snapshot.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                self.day_total = daily_total(&snapshot, today, timezone);
                self.transactions = snapshot;
                self.loading = false;
            }
            StoreEvent::Lost(reason) => {
                tracing::warn!("live channel lost: {reason}");
                self.loading = false;
            }
        }
    }
}

/// Sum of `value` over the records whose `created_at` falls on `day` in
/// `timezone`. Summation is over an unordered multiset; the result does not
/// depend on iteration order.
#[must_use]
pub fn daily_total(transactions: &[Transaction], day: NaiveDate, timezone: Tz) -> Money {
    transactions
        .iter()
        .filter(|tx| tx.created_at.with_timezone(&timezone).date_naive() == day)
        .map(|tx| tx.value)
        .sum()
}

/// A live subscription bound to its reduced view.
///
/// "Today" is evaluated at aggregation time against the projection's
/// timezone, so two viewers configured with different zones legitimately
/// see different totals during the hours their days diverge.
pub struct Projection {
    subscription: Subscription,
    timezone: Tz,
    view: LedgerView,
}

impl Projection {
    #[must_use]
    pub fn new(subscription: Subscription, timezone: Tz) -> Self {
        Self {
            subscription,
            timezone,
            view: LedgerView::new(),
        }
    }

    #[must_use]
    pub fn view(&self) -> &LedgerView {
        &self.view
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Waits for the next store event and applies it.
    ///
    /// Returns `false` once the store has closed the feed.
    pub async fn changed(&mut self) -> bool {
        match self.subscription.next_event().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Applies all already-delivered events without waiting.
    pub fn drain(&mut self) {
        while let Some(event) = self.subscription.try_next_event() {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: StoreEvent) {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        self.view.apply(event, today, self.timezone);
    }
}
