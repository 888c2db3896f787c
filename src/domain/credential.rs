//! Credential issued for an approved request.
//!
//! A credential is derived, never persisted as its own entity. It references
//! the request id through a canonical payload string and advertises a
//! validity window; the window is not re-checked at the exit point.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{OutpassError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the canonical payload encoded into every credential.
pub const PAYLOAD_PREFIX: &str = "OUTPASS:";

/// Build the canonical payload string for a request id.
pub fn payload_for(id: &str) -> String {
    format!("{}{}", PAYLOAD_PREFIX, id)
}

fn keyed_mac(secret: &str, parts: &[&str]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| OutpassError::Internal(format!("Invalid signing key: {}", e)))?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            mac.update(b"|");
        }
        mac.update(part.as_bytes());
    }
    Ok(mac)
}

/// Hex HMAC-SHA256 under `secret` of the parts joined by `|`.
pub fn keyed_digest(secret: &str, parts: &[&str]) -> Result<String> {
    Ok(hex::encode(keyed_mac(secret, parts)?.finalize().into_bytes()))
}

/// Constant-time check of a hex signature produced by [`keyed_digest`].
pub fn verify_keyed_digest(secret: &str, parts: &[&str], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    keyed_mac(secret, parts)
        .map(|mac| mac.verify_slice(&expected).is_ok())
        .unwrap_or(false)
}

/// Verifiable credential for an approved outpass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    /// `OUTPASS:{id}`
    pub payload: String,
    /// Keyed digest over the payload and validity window.
    pub signature: String,
    pub retrieval_url: String,
    pub issued_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        id: &str,
        retrieval_url: String,
        issued_at: DateTime<Utc>,
        validity: Duration,
        signing_secret: &str,
    ) -> Result<Self> {
        let payload = payload_for(id);
        let valid_until = issued_at + validity;
        let signature = keyed_digest(
            signing_secret,
            &[&payload, &valid_until.timestamp().to_string()],
        )?;
        Ok(Self {
            id: id.to_string(),
            payload,
            signature,
            retrieval_url,
            issued_at,
            valid_until,
        })
    }

    /// Check the signature against `signing_secret`.
    pub fn verify_signature(&self, signing_secret: &str) -> bool {
        verify_keyed_digest(
            signing_secret,
            &[&self.payload, &self.valid_until.timestamp().to_string()],
            &self.signature,
        )
    }

    /// Advertised validity, in whole hours.
    pub fn validity_hours(&self) -> i64 {
        (self.valid_until - self.issued_at).num_hours()
    }
}
