//! Credential renderers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;

use super::CredentialRenderer;
use crate::domain::credential::{keyed_digest, verify_keyed_digest};
use crate::error::{OutpassError, Result};

/// Renderer that publishes credentials behind signed, expiring links.
///
/// The link is `{base_url}/{filename}?expires={unix}&signature={hex}` where
/// the signature covers the filename, the payload and the expiry. The object
/// server behind `base_url` is expected to check the same digest.
#[derive(Clone)]
pub struct SignedLinkRenderer {
    base_url: String,
    secret: String,
    link_ttl: Duration,
}

impl SignedLinkRenderer {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>, link_ttl: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            link_ttl,
        }
    }

    fn sign(&self, filename: &str, payload: &str, expires: i64) -> Result<String> {
        keyed_digest(&self.secret, &[filename, payload, &expires.to_string()])
    }

    /// Check a link's signature and expiry.
    pub fn verify(&self, filename: &str, payload: &str, expires: i64, signature: &str) -> bool {
        expires > Utc::now().timestamp()
            && verify_keyed_digest(
                &self.secret,
                &[filename, payload, &expires.to_string()],
                signature,
            )
    }
}

#[async_trait]
impl CredentialRenderer for SignedLinkRenderer {
    async fn render(&self, payload: &str, filename: &str) -> Result<String> {
        if self.base_url.is_empty() {
            return Err(OutpassError::IssuanceError(
                "credential base URL is not configured".to_string(),
            ));
        }

        let expires = (Utc::now() + self.link_ttl).timestamp();
        let signature = self.sign(filename, payload, expires)?;
        Ok(format!(
            "{}/{}?expires={}&signature={}",
            self.base_url, filename, expires, signature
        ))
    }
}

/// Mock renderer for testing.
///
/// Records every render call and returns `{base_url}/{filename}`, or fails
/// every call when built with [`MockRenderer::failing`].
#[derive(Clone, Default)]
pub struct MockRenderer {
    base_url: Option<String>,
    rendered: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockRenderer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            rendered: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// `(payload, filename)` pairs passed to `render`.
    pub fn rendered(&self) -> Vec<(String, String)> {
        self.rendered.lock().clone()
    }
}

#[async_trait]
impl CredentialRenderer for MockRenderer {
    async fn render(&self, payload: &str, filename: &str) -> Result<String> {
        self.rendered
            .lock()
            .push((payload.to_string(), filename.to_string()));
        match &self.base_url {
            Some(base) => Ok(format!("{}/{}", base, filename)),
            None => Err(OutpassError::IssuanceError(format!(
                "mock render of {} failed",
                filename
            ))),
        }
    }
}
