use rusqlite::Connection;

use crate::error::Result;

/// Initialise the reminders schema in `conn`.
///
/// Creates the `reminders` table (idempotent) and an index on the due
/// columns so the per-minute polling query stays efficient even with
/// thousands of reminders.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS reminders (
            id            TEXT NOT NULL PRIMARY KEY,
            task          TEXT NOT NULL,
            reminder_date TEXT NOT NULL,   -- YYYY-MM-DD
            reminder_time TEXT NOT NULL,   -- HH:MM
            notes         TEXT,
            phone_number  TEXT,
            repetition    TEXT NOT NULL DEFAULT 'none',
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        ) STRICT;

        -- Due lookup: SELECT … WHERE reminder_date = ? AND reminder_time = ?
        CREATE INDEX IF NOT EXISTS idx_reminders_due
            ON reminders (reminder_date, reminder_time);
        ",
    )?;
    Ok(())
}
