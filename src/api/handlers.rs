use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use super::decode::decoder_from_headers;
use super::response::{ApiError, DecisionResponse, confirmation_page};
use crate::domain::request::NewOutpassRequest;
use crate::error::OutpassError;
use crate::workflow::Access;

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /outpass`
pub async fn submit(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: NewOutpassRequest = serde_json::from_slice(&body)
        .map_err(|e| OutpassError::ValidationError(format!("Invalid JSON body: {}", e)))?;

    let submission = state.workflow.submit(request).await?;

    Ok(Json(json!({
        "message": "Outpass request submitted successfully",
        "record": submission.record,
        "requestDetails": submission.summary,
    }))
    .into_response())
}

/// `POST /approve`
///
/// Browser form posts get an HTML page; everything else gets JSON.
pub async fn approve(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let decoder = decoder_from_headers(&headers);
    let request = decoder.decode(&body).map_err(ApiError::detailed)?;

    let outcome = state
        .workflow
        .decide_request(request)
        .await
        .map_err(ApiError::detailed)?;

    if decoder.is_form() {
        Ok(confirmation_page(&outcome).into_response())
    } else {
        Ok(Json(DecisionResponse::from(&outcome)).into_response())
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    id: Option<String>,
}

/// `GET /verify?id=`
pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<Response, ApiError> {
    let access = match params.id.as_deref() {
        Some(id) if !id.trim().is_empty() => state.workflow.check_access(id).await?,
        _ => Access::Denied,
    };

    Ok(match access {
        Access::Granted => {
            (StatusCode::OK, Json(json!({ "message": "QR valid. Access granted." }))).into_response()
        }
        Access::Denied => (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "QR invalid or not approved." })),
        )
            .into_response(),
    })
}

#[derive(Debug, Deserialize)]
pub struct RecordParams {
    #[serde(rename = "rollNumber")]
    roll_number: Option<String>,
}

/// `GET /record?rollNumber=`
pub async fn record(
    State(state): State<AppState>,
    Query(params): Query<RecordParams>,
) -> Result<Response, ApiError> {
    let roll_number = params.roll_number.unwrap_or_default();

    match state.workflow.lookup(&roll_number).await {
        Ok(record) => Ok(Json(json!({ "message": "Record found", "record": record })).into_response()),
        Err(OutpassError::NotFound(_)) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Record not found" })),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}
