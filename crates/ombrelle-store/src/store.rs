use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use ombrelle_core::{NewReminder, Reminder, Repetition};

use crate::{
    db::init_db,
    error::{Result, StoreError},
};

/// Column format for `reminder_date`.
pub const DATE_FMT: &str = "%Y-%m-%d";
/// Column format for `reminder_time` (minute granularity).
pub const TIME_FMT: &str = "%H:%M";

const REMINDER_COLUMNS: &str = "id, task, reminder_date, reminder_time,
                notes, phone_number, repetition, created_at, updated_at";

/// Shared handle over the reminders table.
#[derive(Clone)]
pub struct ReminderStore {
    conn: Arc<Mutex<Connection>>,
}

type ReminderRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
);

/// Map a SELECT row (column order from REMINDER_COLUMNS) to its raw parts.
fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReminderRow> {
    Ok((
        row.get(0)?, // id
        row.get(1)?, // task
        row.get(2)?, // reminder_date
        row.get(3)?, // reminder_time
        row.get(4)?, // notes
        row.get(5)?, // phone_number
        row.get(6)?, // repetition
        row.get(7)?, // created_at
        row.get(8)?, // updated_at
    ))
}

/// Parse raw column values into a [`Reminder`].
///
/// Returns `None` for rows whose date, time, or repetition no longer parse;
/// corrupt rows are dropped from query results rather than failing the call.
fn parse_row(raw: ReminderRow) -> Option<Reminder> {
    let (id, task, date_str, time_str, notes, phone_number, rep_str, created_at, updated_at) = raw;
    let reminder_date = NaiveDate::parse_from_str(&date_str, DATE_FMT).ok()?;
    let reminder_time = NaiveTime::parse_from_str(&time_str, TIME_FMT).ok()?;
    let repetition = Repetition::from_str(&rep_str).ok()?;
    Some(Reminder {
        id,
        task,
        reminder_date,
        reminder_time,
        notes,
        phone_number,
        repetition,
        created_at,
        updated_at,
    })
}

impl ReminderStore {
    /// Wrap `conn`, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert a new reminder. Returns the fully populated record.
    pub fn insert(&self, new: NewReminder) -> Result<Reminder> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO reminders
             (id, task, reminder_date, reminder_time, notes, phone_number,
              repetition, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?8)",
            rusqlite::params![
                id,
                new.task,
                new.reminder_date.format(DATE_FMT).to_string(),
                new.reminder_time.format(TIME_FMT).to_string(),
                new.notes,
                new.phone_number,
                new.repetition.to_string(),
                now,
            ],
        )?;
        info!(reminder_id = %id, task = %new.task, "reminder added");

        Ok(Reminder {
            id,
            task: new.task,
            reminder_date: new.reminder_date,
            reminder_time: new.reminder_time,
            notes: new.notes,
            phone_number: new.phone_number,
            repetition: new.repetition,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Return all reminders ordered by due date, then time.
    pub fn list(&self) -> Result<Vec<Reminder>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REMINDER_COLUMNS}
             FROM reminders ORDER BY reminder_date, reminder_time"
        ))?;
        let reminders = stmt
            .query_map([], read_row)?
            .filter_map(|r| r.ok())
            .filter_map(parse_row)
            .collect();
        Ok(reminders)
    }

    /// Delete a reminder by ID. Returns `NotFound` if no row is deleted.
    pub fn delete(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute("DELETE FROM reminders WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        info!(reminder_id = %id, "reminder removed");
        Ok(())
    }

    /// Return every reminder due exactly at `date` + `time`.
    ///
    /// Matching is strict equality on both columns; a reminder due one
    /// minute earlier or later is not returned.
    pub fn find_due(&self, date: NaiveDate, time: NaiveTime) -> Result<Vec<Reminder>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {REMINDER_COLUMNS}
             FROM reminders
             WHERE reminder_date = ?1 AND reminder_time = ?2"
        ))?;
        let reminders = stmt
            .query_map(
                [
                    date.format(DATE_FMT).to_string(),
                    time.format(TIME_FMT).to_string(),
                ],
                read_row,
            )?
            .filter_map(|r| r.ok())
            .filter_map(parse_row)
            .collect();
        Ok(reminders)
    }

    /// Move a reminder's due date forward. Partial update: only
    /// `reminder_date` and `updated_at` change.
    pub fn update_date(&self, id: &str, new_date: NaiveDate) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE reminders SET reminder_date = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![
                new_date.format(DATE_FMT).to_string(),
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }
        Ok(())
    }
}
