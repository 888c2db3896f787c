//! Outbound notification fan-out.
//!
//! Sends to distinct channels run concurrently and are joined. Two policies
//! are provided and selected explicitly by callers:
//!
//! - [`FanOutPolicy::Strict`]: any channel failure fails the whole call.
//! - [`FanOutPolicy::BestEffort`]: channel failures are logged and counted,
//!   and the call always succeeds.
//!
//! There are no retries, no backoff and no cancellation. Once a send has been
//! dispatched it is not withdrawn, even if a sibling send fails.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;

use crate::error::{OutpassError, Result};

pub mod messages;
pub mod mock;
pub mod transport;

pub use mock::{MockCall, MockTransport};
pub use transport::{MailRelayOptions, ReqwestTransport, TwilioOptions};

/// A single outbound message addressed to one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum Notification {
    Email {
        to: String,
        subject: String,
        body: String,
        is_html: bool,
    },
    Sms {
        to: String,
        text: String,
    },
}

impl Notification {
    pub fn html_email(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Notification::Email {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            is_html: true,
        }
    }

    pub fn sms(to: impl Into<String>, text: impl Into<String>) -> Self {
        Notification::Sms {
            to: to.into(),
            text: text.into(),
        }
    }

    /// Channel label used in logs and metrics.
    pub fn channel(&self) -> &'static str {
        match self {
            Notification::Email { .. } => "email",
            Notification::Sms { .. } => "sms",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Notification::Email { to, .. } | Notification::Sms { to, .. } => to,
        }
    }
}

/// Transport for delivering notifications.
///
/// This abstraction allows production delivery through external providers
/// and recording/failing mock implementations in tests.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Send an email, optionally with an HTML body.
    async fn send_email(&self, to: &str, subject: &str, body: &str, is_html: bool) -> Result<()>;

    /// Send a text message to a mobile number.
    async fn send_sms(&self, to: &str, text: &str) -> Result<()>;
}

/// How a fan-out treats per-channel failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutPolicy {
    /// All sends are awaited together; the first failure fails the call.
    Strict,
    /// Each failure is logged and swallowed; the call always succeeds.
    BestEffort,
}

impl FanOutPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanOutPolicy::Strict => "strict",
            FanOutPolicy::BestEffort => "best_effort",
        }
    }
}

/// Per-call summary of a fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub attempted: usize,
    pub failed: usize,
}

impl FanOutReport {
    pub fn delivered(&self) -> usize {
        self.attempted - self.failed
    }
}

/// Concurrent fan-out of notifications over a shared transport.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn NotificationTransport>,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn NotificationTransport>) -> Self {
        Self { transport }
    }

    /// Dispatch `notifications` under `policy`.
    #[tracing::instrument(skip(self, policy, notifications), fields(policy = policy.as_str(), count = notifications.len()))]
    pub async fn dispatch(
        &self,
        policy: FanOutPolicy,
        notifications: Vec<Notification>,
    ) -> Result<FanOutReport> {
        match policy {
            FanOutPolicy::Strict => self.dispatch_strict(notifications).await,
            FanOutPolicy::BestEffort => Ok(self.dispatch_best_effort(notifications).await),
        }
    }

    /// Send everything concurrently; fail if any send fails.
    ///
    /// Every send runs to completion before the result is decided, so a
    /// failing channel never aborts its siblings. Delivery may be partial
    /// when this returns an error.
    pub async fn dispatch_strict(&self, notifications: Vec<Notification>) -> Result<FanOutReport> {
        let attempted = notifications.len();
        let results = join_all(notifications.iter().map(|n| self.send(n))).await;

        let mut first_error = None;
        let mut failed = 0;
        for (notification, result) in notifications.iter().zip(results) {
            if let Err(e) = result {
                failed += 1;
                counter!(
                    "outpass_notifications_failed_total",
                    "channel" => notification.channel(),
                    "policy" => FanOutPolicy::Strict.as_str()
                )
                .increment(1);
                tracing::error!(
                    channel = notification.channel(),
                    recipient = %notification.recipient(),
                    error = %e,
                    "Notification failed during strict fan-out"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => {
                tracing::error!(attempted, failed, "Strict fan-out failed");
                Err(e)
            }
            None => Ok(FanOutReport {
                attempted,
                failed: 0,
            }),
        }
    }

    /// Send everything concurrently; log failures and report success regardless.
    pub async fn dispatch_best_effort(&self, notifications: Vec<Notification>) -> FanOutReport {
        let attempted = notifications.len();
        let results = join_all(notifications.iter().map(|n| self.send(n))).await;

        let mut failed = 0;
        for (notification, result) in notifications.iter().zip(results) {
            if let Err(e) = result {
                failed += 1;
                counter!(
                    "outpass_notifications_failed_total",
                    "channel" => notification.channel(),
                    "policy" => FanOutPolicy::BestEffort.as_str()
                )
                .increment(1);
                tracing::warn!(
                    channel = notification.channel(),
                    recipient = %notification.recipient(),
                    error = %e,
                    "Notification failed, continuing"
                );
            }
        }

        FanOutReport { attempted, failed }
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let result = match notification {
            Notification::Email {
                to,
                subject,
                body,
                is_html,
            } => self.transport.send_email(to, subject, body, *is_html).await,
            Notification::Sms { to, text } => self.transport.send_sms(to, text).await,
        };

        result.map_err(|e| match e {
            OutpassError::TransportError(_) => e,
            other => OutpassError::TransportError(other.to_string()),
        })
    }
}
