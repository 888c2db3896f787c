//! Response bodies and error mapping for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;

use crate::domain::request::Decision;
use crate::error::OutpassError;
use crate::workflow::DecisionOutcome;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// An error rendered as `{error, details?}` with a mapped status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(error: OutpassError, with_details: bool) -> Self {
        let status = status_for(&error);
        let body = if status.is_server_error() {
            tracing::error!(error = %error, "Request failed");
            ErrorBody {
                error: "Internal server error".to_string(),
                details: with_details.then(|| error.to_string()),
            }
        } else {
            let message = match error {
                OutpassError::ValidationError(msg) => msg,
                other => other.to_string(),
            };
            ErrorBody {
                error: message,
                details: None,
            }
        };
        Self { status, body }
    }

    /// Map an error, including `details` for server errors.
    pub fn detailed(error: OutpassError) -> Self {
        Self::new(error, true)
    }
}

impl From<OutpassError> for ApiError {
    fn from(error: OutpassError) -> Self {
        Self::new(error, false)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for each error kind.
pub fn status_for(error: &OutpassError) -> StatusCode {
    match error {
        OutpassError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Confirmation page shown after a form submission; closes itself after 3s.
pub fn confirmation_page(outcome: &DecisionOutcome) -> Html<String> {
    let details = match outcome.decision {
        Decision::Approve => {
            let hours = outcome
                .credential
                .as_ref()
                .map(|c| c.validity_hours())
                .unwrap_or_default();
            format!(
                "<p>Outpass has been approved successfully.</p>\n\
                 <p>QR Code has been generated and sent to parent's mobile number.</p>\n\
                 <p>The QR code link will expire in {} hours.</p>",
                hours
            )
        }
        Decision::Reject => "<p>Outpass has been rejected.</p>".to_string(),
    };

    Html(format!(
        r#"<html>
<body>
<h2>Success!</h2>
{details}
<script>
    setTimeout(() => {{
        window.close();
    }}, 3000);
</script>
</body>
</html>"#
    ))
}

/// JSON acknowledgement for API clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse<'a> {
    pub message: &'a str,
    pub id: &'a str,
    pub status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

impl<'a> From<&'a DecisionOutcome> for DecisionResponse<'a> {
    fn from(outcome: &'a DecisionOutcome) -> Self {
        Self {
            message: &outcome.message,
            id: &outcome.id,
            status: outcome.status.as_str(),
            retrieval_url: outcome.credential.as_ref().map(|c| c.retrieval_url.as_str()),
            valid_until: outcome.credential.as_ref().map(|c| c.valid_until.to_rfc3339()),
        }
    }
}
