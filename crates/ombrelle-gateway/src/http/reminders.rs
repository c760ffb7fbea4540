//! Reminder CRUD endpoints.
//!
//! POST /reminders   — create; sends an acknowledgment SMS when a phone
//!                     number is given (fire-and-forget).
//! GET  /reminders   — full list, ordered by due date then time.
//! DELETE /reminders/{id}
//!
//! The scheduler engine is the only writer of `reminder_date` after
//! creation; these handlers never touch it.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::warn;

use ombrelle_core::{NewReminder, Reminder, Repetition};
use ombrelle_notify::message::ack_body;
use ombrelle_store::StoreError;

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReminderRequest {
    pub task: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM — seconds are accepted and truncated.
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Defaults to no repetition. Case-insensitive.
    #[serde(default)]
    pub repetition: Option<String>,
}

impl CreateReminderRequest {
    fn into_new_reminder(self) -> Result<NewReminder, String> {
        if self.task.trim().is_empty() {
            return Err("task must not be empty".into());
        }
        let reminder_date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| format!("invalid date: {}", self.date))?;
        let reminder_time = parse_minute(&self.time)?;
        let repetition = match self.repetition.as_deref() {
            None | Some("") => Repetition::None,
            Some(s) => Repetition::from_str(s)?,
        };
        Ok(NewReminder {
            task: self.task,
            reminder_date,
            reminder_time,
            notes: self.notes,
            phone_number: self.phone_number,
            repetition,
        })
    }
}

/// Parse "HH:MM" (or "HH:MM:SS", truncated) into a minute-granular time.
fn parse_minute(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map(|t| t.with_second(0).unwrap_or(t))
        .map_err(|_| format!("invalid time: {s}"))
}

#[derive(Serialize)]
pub struct RemindersResponse {
    pub reminders: Vec<Reminder>,
}

#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
}

fn bad_request(msg: String) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: msg }))
}

fn internal(err: impl std::fmt::Display) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: err.to_string(),
        }),
    )
}

/// POST /reminders — create a reminder and acknowledge it over SMS.
pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReminderRequest>,
) -> Result<(StatusCode, Json<Reminder>), (StatusCode, Json<ApiError>)> {
    let new = req.into_new_reminder().map_err(bad_request)?;
    let reminder = state.store.insert(new).map_err(internal)?;

    // Acknowledgment SMS; the request never waits on the provider.
    if let Some(ref to) = reminder.phone_number {
        let notifier = Arc::clone(&state.notifier);
        let to = to.clone();
        let body = ack_body(&reminder);
        let id = reminder.id.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&to, &body).await {
                warn!(reminder_id = %id, error = %e, "acknowledgment SMS failed");
            }
        });
    }

    Ok((StatusCode::CREATED, Json(reminder)))
}

/// GET /reminders — every reminder, soonest first.
pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RemindersResponse>, (StatusCode, Json<ApiError>)> {
    let reminders = state.store.list().map_err(internal)?;
    Ok(Json(RemindersResponse { reminders }))
}

/// DELETE /reminders/{id}
pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    match state.store.delete(&id) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound { id }) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: format!("no reminder with id {id}"),
            }),
        )),
        Err(e) => Err(internal(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(date: &str, time: &str, repetition: Option<&str>) -> CreateReminderRequest {
        CreateReminderRequest {
            task: "Take meds".into(),
            date: date.into(),
            time: time.into(),
            notes: None,
            phone_number: None,
            repetition: repetition.map(String::from),
        }
    }

    #[test]
    fn valid_request_parses() {
        let new = request("2025-06-15", "09:00", Some("Daily"))
            .into_new_reminder()
            .unwrap();
        assert_eq!(new.repetition, Repetition::Daily);
        assert_eq!(
            new.reminder_date,
            NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
        );
        assert_eq!(
            new.reminder_time,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn seconds_are_truncated() {
        let new = request("2025-06-15", "09:00:45", None)
            .into_new_reminder()
            .unwrap();
        assert_eq!(
            new.reminder_time,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_repetition_defaults_to_none() {
        let new = request("2025-06-15", "09:00", None)
            .into_new_reminder()
            .unwrap();
        assert_eq!(new.repetition, Repetition::None);
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(request("15/06/2025", "09:00", None)
            .into_new_reminder()
            .is_err());
    }

    #[test]
    fn bad_time_is_rejected() {
        assert!(request("2025-06-15", "9am", None)
            .into_new_reminder()
            .is_err());
    }

    #[test]
    fn empty_task_is_rejected() {
        let mut req = request("2025-06-15", "09:00", None);
        req.task = "  ".into();
        assert!(req.into_new_reminder().is_err());
    }
}
