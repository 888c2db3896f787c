//! Mock notification transport for testing.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Notification, NotificationTransport};
use crate::error::{OutpassError, Result};

/// Record of a send made through the mock transport.
pub type MockCall = Notification;

/// Mock transport that records every send without delivering anything.
///
/// Individual recipients can be configured to fail, which is how tests drive
/// the strict and best-effort fan-out policies.
///
/// # Example
/// ```ignore
/// let transport = Arc::new(MockTransport::new());
/// transport.fail_recipient("+15550000002");
/// let dispatcher = NotificationDispatcher::new(transport.clone());
/// ```
#[derive(Clone, Default)]
pub struct MockTransport {
    calls: Arc<Mutex<Vec<MockCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send to `recipient` fail.
    pub fn fail_recipient(&self, recipient: &str) {
        self.failing.lock().insert(recipient.to_string());
    }

    /// Stop failing sends to `recipient`.
    pub fn heal_recipient(&self, recipient: &str) {
        self.failing.lock().remove(recipient);
    }

    /// Get all sends that have been attempted, including failed ones.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Recipients of attempted SMS sends, in call order.
    pub fn sms_recipients(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Notification::Sms { to, .. } => Some(to.clone()),
                _ => None,
            })
            .collect()
    }

    /// Attempted SMS bodies sent to `recipient`.
    pub fn sms_to(&self, recipient: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Notification::Sms { to, text } if to == recipient => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Attempted emails as `(to, subject, body)`.
    pub fn emails(&self) -> Vec<(String, String, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Notification::Email {
                    to, subject, body, ..
                } => Some((to.clone(), subject.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: MockCall) -> Result<()> {
        let recipient = call.recipient().to_string();
        let channel = call.channel();
        self.calls.lock().push(call);

        if self.failing.lock().contains(&recipient) {
            return Err(OutpassError::TransportError(format!(
                "mock {} delivery to {} failed",
                channel, recipient
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationTransport for MockTransport {
    async fn send_email(&self, to: &str, subject: &str, body: &str, is_html: bool) -> Result<()> {
        self.record(Notification::Email {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            is_html,
        })
    }

    async fn send_sms(&self, to: &str, text: &str) -> Result<()> {
        self.record(Notification::sms(to, text))
    }
}
