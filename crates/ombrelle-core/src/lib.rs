//! `ombrelle-core` — shared types and configuration for the Ombrelle backend.

pub mod config;
pub mod error;
pub mod types;

pub use config::OmbrelleConfig;
pub use error::{CoreError, Result};
pub use types::{NewReminder, Reminder, Repetition};
