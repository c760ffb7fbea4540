use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, Timelike};
use tokio::{sync::watch, task::JoinSet};
use tracing::{error, info, warn};

use ombrelle_core::{Reminder, Repetition};
use ombrelle_notify::{message::reminder_body, Notifier};
use ombrelle_store::{ReminderStore, StoreError};

use crate::{
    clock::{Clock, SystemClock},
    recurrence::next_occurrence,
};

/// Aggregate outcome of one tick, for logs and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// Reminders matched by the due query.
    pub due: usize,
    /// Notifications accepted by the transport.
    pub sent: usize,
    /// Notifications that failed (logged and swallowed, never retried).
    pub dispatch_failures: usize,
    /// Recurring reminders whose date was advanced.
    pub rescheduled: usize,
    /// Date writes that failed and were deferred to a later tick.
    pub reschedule_failures: usize,
}

/// Core scheduler: fires due reminders once per minute and advances
/// recurring ones.
///
/// Dispatch and reschedule are independently best-effort and not
/// transactionally linked: a reminder can be sent but fail to advance, or
/// advance without being sent. Neither outcome blocks other reminders.
pub struct SchedulerEngine {
    store: ReminderStore,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    /// Next dates whose write failed after the reminder already fired.
    /// Retried at the start of every tick so the reminder is neither
    /// re-sent nor left stuck at its old date.
    pending_reschedules: HashMap<String, NaiveDate>,
}

impl SchedulerEngine {
    /// Create an engine on the system clock.
    pub fn new(store: ReminderStore, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_clock(store, notifier, Arc::new(SystemClock))
    }

    /// Create an engine on an explicit clock. Tests use this to drive
    /// [`tick`](Self::tick) synchronously at a chosen instant.
    pub fn with_clock(
        store: ReminderStore,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            pending_reschedules: HashMap::new(),
        }
    }

    /// Main event loop. Ticks at each minute boundary until `shutdown`
    /// broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("scheduler engine started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(until_next_minute()) => {
                    let summary = self.tick().await;
                    if summary != TickSummary::default() {
                        info!(?summary, "tick complete");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Run one tick: retry deferred date writes, fire everything due at the
    /// current minute, advance recurring reminders.
    ///
    /// Never returns an error: every failure inside a tick is logged and
    /// isolated per reminder (or, for the due query, abandons just this
    /// tick).
    pub async fn tick(&mut self) -> TickSummary {
        let mut summary = TickSummary::default();

        self.retry_pending(&mut summary);

        // One consistent timestamp for the whole tick.
        let (today, minute) = self.clock.now_minute();
        let due = match self.store.find_due(today, minute) {
            Ok(due) => due,
            Err(e) => {
                // No partial processing; the next minute retries naturally.
                error!(error = %e, "due-reminder query failed, abandoning tick");
                return summary;
            }
        };
        summary.due = due.len();

        let mut dispatches = JoinSet::new();
        for reminder in due {
            // An outstanding reschedule means this reminder already fired at
            // this due instant; only the date write is still pending.
            if self.pending_reschedules.contains_key(&reminder.id) {
                continue;
            }

            if let Some(ref to) = reminder.phone_number {
                let notifier = Arc::clone(&self.notifier);
                let to = to.clone();
                let body = reminder_body(&reminder.task, reminder.notes.as_deref());
                let id = reminder.id.clone();
                dispatches.spawn(async move {
                    match notifier.send(&to, &body).await {
                        Ok(()) => {
                            info!(reminder_id = %id, %to, "reminder sent");
                            true
                        }
                        Err(e) => {
                            warn!(reminder_id = %id, error = %e, "reminder dispatch failed");
                            false
                        }
                    }
                });
            }

            self.advance(&reminder, &mut summary);
        }

        // Sends already ran concurrently; this only collects the aggregate
        // outcome for the summary.
        while let Some(res) = dispatches.join_next().await {
            match res {
                Ok(true) => summary.sent += 1,
                Ok(false) => summary.dispatch_failures += 1,
                Err(e) => {
                    warn!(error = %e, "dispatch task panicked");
                    summary.dispatch_failures += 1;
                }
            }
        }

        summary
    }

    /// Move a recurring reminder's date to its next occurrence.
    fn advance(&mut self, reminder: &Reminder, summary: &mut TickSummary) {
        if reminder.repetition == Repetition::None {
            return;
        }
        let Some(next) = next_occurrence(reminder.reminder_date, reminder.repetition) else {
            return;
        };
        match self.store.update_date(&reminder.id, next) {
            Ok(()) => {
                summary.rescheduled += 1;
                info!(reminder_id = %reminder.id, next = %next, "reminder rescheduled");
            }
            Err(e) => {
                summary.reschedule_failures += 1;
                warn!(reminder_id = %reminder.id, error = %e, "reschedule failed, deferring");
                self.pending_reschedules.insert(reminder.id.clone(), next);
            }
        }
    }

    /// Retry date writes deferred from earlier ticks.
    fn retry_pending(&mut self, summary: &mut TickSummary) {
        if self.pending_reschedules.is_empty() {
            return;
        }
        let pending: Vec<(String, NaiveDate)> = self.pending_reschedules.drain().collect();
        for (id, next) in pending {
            match self.store.update_date(&id, next) {
                Ok(()) => {
                    summary.rescheduled += 1;
                    info!(reminder_id = %id, next = %next, "deferred reschedule applied");
                }
                Err(StoreError::NotFound { .. }) => {
                    // Deleted by the user in the meantime; nothing left to do.
                    warn!(reminder_id = %id, "deferred reschedule dropped, reminder gone");
                }
                Err(e) => {
                    warn!(reminder_id = %id, error = %e, "deferred reschedule still failing");
                    self.pending_reschedules.insert(id, next);
                }
            }
        }
    }
}

/// Delay from now to the next wall-clock minute boundary.
fn until_next_minute() -> Duration {
    let second = Local::now().second() as u64;
    Duration::from_secs(60 - second.min(59))
}
