//! Production notification transport using reqwest.
//!
//! SMS goes through the Twilio Messages REST API. Email goes through an HTTP
//! mail relay that accepts a JSON message and a bearer key.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::NotificationTransport;
use crate::error::{OutpassError, Result};

/// Twilio account credentials and sender number.
#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// HTTP mail relay endpoint and sender address.
#[derive(Debug, Clone)]
pub struct MailRelayOptions {
    pub url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    content_type: &'a str,
}

/// Transport delivering SMS via Twilio and email via a mail relay.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    twilio: TwilioOptions,
    mail: MailRelayOptions,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(twilio: TwilioOptions, mail: MailRelayOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            twilio,
            mail,
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the per-send timeout. A timeout surfaces as a transport failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.twilio.account_sid
        )
    }
}

async fn check_status(channel: &str, response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(OutpassError::TransportError(format!(
        "{} provider returned {}: {}",
        channel, status, body
    )))
}

#[async_trait]
impl NotificationTransport for ReqwestTransport {
    #[tracing::instrument(skip(self, subject, body), fields(to = %to))]
    async fn send_email(&self, to: &str, subject: &str, body: &str, is_html: bool) -> Result<()> {
        let message = RelayMessage {
            from: &self.mail.from,
            to,
            subject,
            body,
            content_type: if is_html { "text/html" } else { "text/plain" },
        };

        let response = self
            .client
            .post(&self.mail.url)
            .bearer_auth(&self.mail.api_key)
            .timeout(self.timeout)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(to = %to, error = %e, "Mail relay request failed");
                OutpassError::TransportError(format!("email to {} failed: {}", to, e))
            })?;

        check_status("email", response).await?;
        tracing::debug!(to = %to, "Email sent");
        Ok(())
    }

    #[tracing::instrument(skip(self, text), fields(to = %to))]
    async fn send_sms(&self, to: &str, text: &str) -> Result<()> {
        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", to);
        form_body.insert("From", &self.twilio.from_number);
        form_body.insert("Body", text);

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.twilio.account_sid, Some(&self.twilio.auth_token))
            .timeout(self.timeout)
            .form(&form_body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(to = %to, error = %e, "Twilio request failed");
                OutpassError::TransportError(format!("sms to {} failed: {}", to, e))
            })?;

        check_status("sms", response).await?;
        tracing::debug!(to = %to, "SMS sent");
        Ok(())
    }
}
