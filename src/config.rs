//! Configuration for the workflow and the server binary.

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;

/// Settings the workflow needs at decision and intake time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Recipient of staff decision requests
    pub staff_email: String,

    /// Public base URL of this service, used to build approve/reject actions
    pub api_endpoint: String,

    /// Advertised validity of issued credentials, in hours
    pub credential_validity_hours: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            staff_email: "outpass-staff@localhost".to_string(),
            api_endpoint: "http://localhost:8080".to_string(),
            credential_validity_hours: 24,
        }
    }
}

impl WorkflowConfig {
    pub fn credential_validity(&self) -> Duration {
        Duration::hours(self.credential_validity_hours)
    }
}

/// Longest accepted credential validity: one year.
pub const MAX_CREDENTIAL_VALIDITY_HOURS: i64 = 24 * 366;

/// Parse a validity window in hours, accepting 1 up to one year.
pub fn parse_validity_hours(raw: &str) -> Result<i64> {
    let hours: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a whole number of hours", raw))?;
    anyhow::ensure!(
        (1..=MAX_CREDENTIAL_VALIDITY_HOURS).contains(&hours),
        "{} hours is outside 1..={}",
        hours,
        MAX_CREDENTIAL_VALIDITY_HOURS
    );
    Ok(hours)
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub workflow: WorkflowConfig,
    pub credential_base_url: String,
    pub credential_signing_secret: String,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let defaults = WorkflowConfig::default();
        let workflow = WorkflowConfig {
            staff_email: env::var("STAFF_EMAIL").context("STAFF_EMAIL must be set")?,
            api_endpoint: env::var("API_ENDPOINT").unwrap_or(defaults.api_endpoint),
            credential_validity_hours: match env::var("CREDENTIAL_VALIDITY_HOURS") {
                Ok(v) => parse_validity_hours(&v).context("Invalid CREDENTIAL_VALIDITY_HOURS")?,
                Err(_) => defaults.credential_validity_hours,
            },
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            workflow,
            credential_base_url: env::var("CREDENTIAL_BASE_URL")
                .context("CREDENTIAL_BASE_URL must be set")?,
            credential_signing_secret: env::var("CREDENTIAL_SIGNING_SECRET")
                .context("CREDENTIAL_SIGNING_SECRET must be set")?,
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID")
                .context("TWILIO_ACCOUNT_SID must be set")?,
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN")
                .context("TWILIO_AUTH_TOKEN must be set")?,
            twilio_from_number: env::var("TWILIO_FROM_NUMBER")
                .context("TWILIO_FROM_NUMBER must be set")?,
            mail_api_url: env::var("MAIL_API_URL").context("MAIL_API_URL must be set")?,
            mail_api_key: env::var("MAIL_API_KEY").context("MAIL_API_KEY must be set")?,
            mail_from: env::var("MAIL_FROM").context("MAIL_FROM must be set")?,
        })
    }
}
