//! Notification body builders.
//!
//! Kept next to the transports so every SMS the system sends is written in
//! one place, whichever subsystem triggers it.

use ombrelle_core::Reminder;

/// Body of the SMS sent when a reminder fires.
///
/// Missing notes are rendered as the literal "None".
pub fn reminder_body(task: &str, notes: Option<&str>) -> String {
    format!(
        "⏰ Ombrelle Reminder: {}. Notes: {}",
        task,
        notes.unwrap_or("None")
    )
}

/// Body of the acknowledgment SMS sent right after a reminder is created.
pub fn ack_body(reminder: &Reminder) -> String {
    format!(
        "✅ Reminder Set: \"{}\" for {} at {}. Repetition: {}.",
        reminder.task,
        reminder.reminder_date.format("%Y-%m-%d"),
        reminder.reminder_time.format("%H:%M"),
        reminder.repetition,
    )
}
