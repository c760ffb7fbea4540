//! `ombrelle-notify` — outbound notification transports.
//!
//! The scheduler engine and the HTTP layer only ever see the [`Notifier`]
//! trait; the concrete transport today is SMS via the Twilio REST API
//! ([`SmsSender`]). When no credentials are configured, [`NullNotifier`]
//! stands in and every send fails softly.

pub mod error;
pub mod message;
pub mod notifier;
pub mod sms;

pub use error::NotifyError;
pub use notifier::{Notifier, NullNotifier};
pub use sms::SmsSender;
