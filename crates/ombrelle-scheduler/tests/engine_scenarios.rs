// Tick behavior against a real SQLite store: firing, recurrence advancement,
// and the failure-isolation contract between the two.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use ombrelle_core::{NewReminder, Repetition};
use ombrelle_notify::{NotifyError, Notifier};
use ombrelle_scheduler::{Clock, SchedulerEngine, TickSummary};
use ombrelle_store::ReminderStore;

struct FixedClock {
    date: NaiveDate,
    time: NaiveTime,
}

impl FixedClock {
    fn at(date: &str, time: &str) -> Arc<Self> {
        Arc::new(Self {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        })
    }
}

impl Clock for FixedClock {
    fn now_minute(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }
}

/// Records every accepted send; numbers listed in `reject` fail instead.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    reject: Vec<String>,
}

impl RecordingNotifier {
    fn rejecting(numbers: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: numbers.iter().map(|n| n.to_string()).collect(),
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        if self.reject.iter().any(|n| n == to) {
            return Err(NotifyError::Unavailable("forced failure".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

fn mem_store() -> ReminderStore {
    ReminderStore::new(rusqlite::Connection::open_in_memory().unwrap()).unwrap()
}

fn reminder(
    task: &str,
    date: &str,
    time: &str,
    phone: Option<&str>,
    repetition: Repetition,
) -> NewReminder {
    NewReminder {
        task: task.into(),
        reminder_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        reminder_time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        notes: None,
        phone_number: phone.map(String::from),
        repetition,
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn daily_reminder_fires_and_advances() {
    let store = mem_store();
    store
        .insert(reminder(
            "Take meds",
            "2025-06-15",
            "09:00",
            Some("+15551234567"),
            Repetition::Daily,
        ))
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut engine = SchedulerEngine::with_clock(
        store.clone(),
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(
        summary,
        TickSummary {
            due: 1,
            sent: 1,
            rescheduled: 1,
            ..Default::default()
        }
    );

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+15551234567");
    assert_eq!(sent[0].1, "⏰ Ombrelle Reminder: Take meds. Notes: None");

    assert_eq!(store.list().unwrap()[0].reminder_date, date("2025-06-16"));
}

#[tokio::test]
async fn one_shot_without_phone_is_left_untouched() {
    let store = mem_store();
    let created = store
        .insert(reminder(
            "Stretch",
            "2025-06-15",
            "09:00",
            None,
            Repetition::None,
        ))
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut engine = SchedulerEngine::with_clock(
        store.clone(),
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(
        summary,
        TickSummary {
            due: 1,
            ..Default::default()
        }
    );
    assert!(notifier.sent().is_empty());

    // Still in the store, date and updated_at untouched.
    let after = &store.list().unwrap()[0];
    assert_eq!(after.reminder_date, created.reminder_date);
    assert_eq!(after.updated_at, created.updated_at);
}

#[tokio::test]
async fn empty_minute_is_a_no_op() {
    let store = mem_store();
    let notifier = Arc::new(RecordingNotifier::default());
    let mut engine = SchedulerEngine::with_clock(
        store,
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(summary, TickSummary::default());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn only_the_exact_minute_matches() {
    let store = mem_store();
    for time in ["08:59", "09:01"] {
        store
            .insert(reminder(
                "Off by a minute",
                "2025-06-15",
                time,
                Some("+15551234567"),
                Repetition::Daily,
            ))
            .unwrap();
    }

    let notifier = Arc::new(RecordingNotifier::default());
    let mut engine = SchedulerEngine::with_clock(
        store.clone(),
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(summary, TickSummary::default());
    assert!(notifier.sent().is_empty());
    for r in store.list().unwrap() {
        assert_eq!(r.reminder_date, date("2025-06-15"));
    }
}

#[tokio::test]
async fn monthly_jan_31_clamps_to_feb_28() {
    let store = mem_store();
    store
        .insert(reminder(
            "Pay rent",
            "2025-01-31",
            "08:00",
            None,
            Repetition::Monthly,
        ))
        .unwrap();

    let mut engine = SchedulerEngine::with_clock(
        store.clone(),
        Arc::new(RecordingNotifier::default()),
        FixedClock::at("2025-01-31", "08:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(summary.rescheduled, 1);
    assert_eq!(store.list().unwrap()[0].reminder_date, date("2025-02-28"));
}

#[tokio::test]
async fn dispatch_failure_still_advances_the_date() {
    let store = mem_store();
    store
        .insert(reminder(
            "Take meds",
            "2025-06-15",
            "09:00",
            Some("+15551234567"),
            Repetition::Daily,
        ))
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::rejecting(&["+15551234567"]));
    let mut engine = SchedulerEngine::with_clock(
        store.clone(),
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(
        summary,
        TickSummary {
            due: 1,
            dispatch_failures: 1,
            rescheduled: 1,
            ..Default::default()
        }
    );
    assert!(notifier.sent().is_empty());
    assert_eq!(store.list().unwrap()[0].reminder_date, date("2025-06-16"));
}

#[tokio::test]
async fn one_failing_reminder_does_not_block_the_others() {
    let store = mem_store();
    store
        .insert(reminder(
            "First",
            "2025-06-15",
            "09:00",
            Some("+15550000001"),
            Repetition::Daily,
        ))
        .unwrap();
    store
        .insert(reminder(
            "Second",
            "2025-06-15",
            "09:00",
            Some("+15550000002"),
            Repetition::Daily,
        ))
        .unwrap();

    let notifier = Arc::new(RecordingNotifier::rejecting(&["+15550000001"]));
    let mut engine = SchedulerEngine::with_clock(
        store.clone(),
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(
        summary,
        TickSummary {
            due: 2,
            sent: 1,
            dispatch_failures: 1,
            rescheduled: 2,
            ..Default::default()
        }
    );
    assert_eq!(notifier.sent()[0].0, "+15550000002");
    // Both advanced regardless of the failed send.
    for r in store.list().unwrap() {
        assert_eq!(r.reminder_date, date("2025-06-16"));
    }
}

#[tokio::test]
async fn query_failure_abandons_the_tick() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ombrelle.db");

    let store = ReminderStore::new(rusqlite::Connection::open(&db_path).unwrap()).unwrap();
    store
        .insert(reminder(
            "Take meds",
            "2025-06-15",
            "09:00",
            Some("+15551234567"),
            Repetition::Daily,
        ))
        .unwrap();

    // Sabotage the schema through a second connection.
    let saboteur = rusqlite::Connection::open(&db_path).unwrap();
    saboteur.execute_batch("DROP TABLE reminders").unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut engine = SchedulerEngine::with_clock(
        store,
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    let summary = engine.tick().await;
    assert_eq!(summary, TickSummary::default());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn failed_reschedule_is_deferred_and_never_redispatched() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ombrelle.db");

    // WAL so readers keep working while a writer holds the lock.
    let conn = rusqlite::Connection::open(&db_path).unwrap();
    conn.execute_batch("PRAGMA journal_mode=WAL;").unwrap();
    let store = ReminderStore::new(conn).unwrap();
    store
        .insert(reminder(
            "Take meds",
            "2025-06-15",
            "09:00",
            Some("+15551234567"),
            Repetition::Daily,
        ))
        .unwrap();

    // A second connection holds the write lock, so SELECTs succeed while
    // UPDATEs fail with SQLITE_BUSY.
    let blocker = rusqlite::Connection::open(&db_path).unwrap();
    blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let mut engine = SchedulerEngine::with_clock(
        store.clone(),
        notifier.clone(),
        FixedClock::at("2025-06-15", "09:00"),
    );

    // Fires, but the date write is deferred.
    let first = engine.tick().await;
    assert_eq!(
        first,
        TickSummary {
            due: 1,
            sent: 1,
            reschedule_failures: 1,
            ..Default::default()
        }
    );

    // Same minute again: still due in the store, but not re-sent.
    let second = engine.tick().await;
    assert_eq!(second.due, 1);
    assert_eq!(second.sent, 0);
    assert_eq!(notifier.sent().len(), 1);

    // Lock released: the deferred write lands and the reminder advances.
    blocker.execute_batch("ROLLBACK").unwrap();
    let third = engine.tick().await;
    assert_eq!(third.rescheduled, 1);
    assert_eq!(third.sent, 0);
    assert_eq!(store.list().unwrap()[0].reminder_date, date("2025-06-16"));
    assert_eq!(notifier.sent().len(), 1);
}
