//! HTTP surface for the workflow.
//!
//! | Route                     | Operation                              |
//! |---------------------------|----------------------------------------|
//! | `POST /outpass`           | submit a request (JSON)                |
//! | `POST /approve`           | approve or reject (form or JSON)       |
//! | `GET /verify?id=`         | exit-point check                       |
//! | `GET /record?rollNumber=` | fetch a stored record                  |
//! | `GET /health`             | liveness                               |

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::workflow::OutpassWorkflow;

pub mod decode;
mod handlers;
pub mod response;

pub use response::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<OutpassWorkflow>,
}

/// Build the router for a workflow.
pub fn router(workflow: OutpassWorkflow) -> Router {
    let state = AppState {
        workflow: Arc::new(workflow),
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/outpass", post(handlers::submit))
        .route("/approve", post(handlers::approve))
        .route("/verify", get(handlers::verify))
        .route("/record", get(handlers::record))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
