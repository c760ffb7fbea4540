use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// How a reminder's due date advances after it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repetition {
    /// Fire once; the scheduler never touches the reminder again.
    None,
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Repetition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Repetition::None => "none",
            Repetition::Daily => "daily",
            Repetition::Weekly => "weekly",
            Repetition::Monthly => "monthly",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Repetition {
    type Err = String;

    /// Case-insensitive: web clients send `"Daily"`, the store holds `"daily"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Repetition::None),
            "daily" => Ok(Repetition::Daily),
            "weekly" => Ok(Repetition::Weekly),
            "monthly" => Ok(Repetition::Monthly),
            other => Err(format!("unknown repetition: {other}")),
        }
    }
}

/// A persisted reminder record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    /// UUID v4 string — primary key.
    pub id: String,
    /// What the user asked to be reminded about.
    pub task: String,
    /// Calendar date the reminder is due. Together with `reminder_time` this
    /// forms the due instant; matching is exact, not a range.
    pub reminder_date: NaiveDate,
    /// Time of day at minute granularity (seconds are always zero).
    pub reminder_time: NaiveTime,
    /// Optional free text appended to the notification body.
    pub notes: Option<String>,
    /// SMS destination. No number means nothing is sent when the reminder fires.
    pub phone_number: Option<String>,
    /// Recurrence policy.
    pub repetition: Repetition,
    /// ISO-8601 timestamp of creation.
    pub created_at: String,
    /// ISO-8601 timestamp of the last update.
    pub updated_at: String,
}

/// Fields supplied by a client when creating a reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReminder {
    pub task: String,
    pub reminder_date: NaiveDate,
    pub reminder_time: NaiveTime,
    pub notes: Option<String>,
    pub phone_number: Option<String>,
    pub repetition: Repetition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn repetition_round_trips_through_strings() {
        for rep in [
            Repetition::None,
            Repetition::Daily,
            Repetition::Weekly,
            Repetition::Monthly,
        ] {
            assert_eq!(Repetition::from_str(&rep.to_string()).unwrap(), rep);
        }
    }

    #[test]
    fn repetition_parses_capitalised_forms() {
        assert_eq!(Repetition::from_str("Daily").unwrap(), Repetition::Daily);
        assert_eq!(Repetition::from_str("None").unwrap(), Repetition::None);
    }

    #[test]
    fn repetition_rejects_unknown() {
        assert!(Repetition::from_str("fortnightly").is_err());
    }
}
