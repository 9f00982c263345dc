//! Attachment file handler.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

/// GET /files/{name}
pub async fn get_file(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(name): Path<String>,
) -> Response {
    let state = state.read().await;

    match state.files.get(&name) {
        Some(body) => (StatusCode::OK, body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("No file named {name}")).into_response(),
    }
}
