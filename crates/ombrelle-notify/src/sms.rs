//! SMS transport over the Twilio REST API.
//!
//! Speaks the Messages endpoint
//! (`POST /2010-04-01/Accounts/{sid}/Messages.json`) with HTTP basic auth
//! and a form-encoded body. No delivery receipts are consumed; a 2xx from
//! the API is treated as "accepted" and nothing more.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use ombrelle_core::config::SmsConfig;

use crate::{error::NotifyError, notifier::Notifier};

pub struct SmsSender {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    base_url: String,
}

/// Subset of the message resource Twilio returns on create.
#[derive(Deserialize)]
struct MessageCreated {
    sid: String,
}

impl SmsSender {
    pub fn new(cfg: &SmsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            account_sid: cfg.account_sid.clone(),
            auth_token: cfg.auth_token.clone(),
            from_number: cfg.from_number.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Notifier for SmsSender {
    fn name(&self) -> &str {
        "sms"
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.account_sid
        );
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", to),
                ("From", self.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // The message sid is the only part of the response worth keeping.
        match resp.json::<MessageCreated>().await {
            Ok(msg) => info!(message_sid = %msg.sid, %to, "SMS accepted"),
            Err(_) => info!(%to, "SMS accepted"),
        }
        Ok(())
    }
}
