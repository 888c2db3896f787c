//! Decision body decoding.
//!
//! Staff decisions arrive either as an HTML form post (`id`, `button`) from
//! the decision email or as JSON (`id`, `decision`) from API clients. The
//! decoder is chosen by a case-insensitive match on the content type and
//! always yields the same [`DecisionRequest`] shape.

use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::domain::request::state::string_or_number;
use crate::error::{OutpassError, Result};
use crate::workflow::DecisionRequest;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Strategy for turning a raw body into a decision request.
pub trait DecisionDecoder: Send + Sync {
    fn decode(&self, body: &[u8]) -> Result<DecisionRequest>;

    /// Whether the caller submitted through a browser form.
    fn is_form(&self) -> bool;
}

#[derive(Deserialize)]
struct JsonFields {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    decision: Option<String>,
}

/// Decodes `application/x-www-form-urlencoded` bodies.
pub struct FormDecoder;

impl DecisionDecoder for FormDecoder {
    fn decode(&self, body: &[u8]) -> Result<DecisionRequest> {
        let mut request = DecisionRequest::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "id" if request.id.is_none() => request.id = Some(value.into_owned()),
                "button" if request.decision.is_none() => {
                    request.decision = Some(value.into_owned())
                }
                _ => {}
            }
        }
        Ok(request)
    }

    fn is_form(&self) -> bool {
        true
    }
}

/// Decodes JSON bodies. Used for every content type other than forms.
pub struct JsonDecoder;

impl DecisionDecoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<DecisionRequest> {
        let fields: JsonFields = serde_json::from_slice(body)
            .map_err(|e| OutpassError::ValidationError(format!("Invalid JSON body: {}", e)))?;
        Ok(DecisionRequest {
            id: fields.id,
            decision: fields.decision,
        })
    }

    fn is_form(&self) -> bool {
        false
    }
}

/// Pick a decoder for a content type value.
pub fn decoder_for(content_type: Option<&str>) -> &'static dyn DecisionDecoder {
    match content_type {
        Some(value) if value.to_ascii_lowercase().contains(FORM_CONTENT_TYPE) => &FormDecoder,
        _ => &JsonDecoder,
    }
}

/// Pick a decoder from request headers. Header names are case-insensitive.
pub fn decoder_from_headers(headers: &HeaderMap) -> &'static dyn DecisionDecoder {
    decoder_for(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))
}
