//! Paginated list endpoint handler.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::client::{BACKEND_HEADER, ORGANIZATION_HEADER};
use crate::mock_server::state::{MockState, RecordedRequest};
use crate::pacer::{REMAINING_HEADER, RESET_HEADER};

/// Query parameters accepted by every list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub request_id: Option<String>,
    pub page: Option<u32>,
    pub widget_common_id: Option<String>,
    pub card_common_id: Option<String>,
}

/// GET /{resource}
pub async fn list_entities(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(resource): Path<String>,
    Query(query): Query<ListQuery>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.write().await;

    let organization = header(&headers, ORGANIZATION_HEADER);
    let authenticated = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));

    state.requests.push(RecordedRequest {
        path: resource.clone(),
        organization: organization.clone(),
        backend: header(&headers, BACKEND_HEADER),
        request_id: query.request_id.clone(),
        page: query.page,
        authenticated,
    });

    let mut response = respond(&mut state, &resource, &query, organization, authenticated);
    decorate(&state, response.headers_mut());
    response
}

fn respond(
    state: &mut MockState,
    resource: &str,
    query: &ListQuery,
    organization: Option<String>,
    authenticated: bool,
) -> Response {
    if state.require_auth && !authenticated {
        return error(StatusCode::UNAUTHORIZED, "Basic authentication required");
    }

    let key = match collection_key(resource, query, organization.as_deref()) {
        Ok(key) => key,
        Err(response) => return response,
    };

    // Follow-up pages must name an open query for the same collection
    let (request_id, page) = match (&query.request_id, query.page) {
        (Some(id), Some(page)) => match state.queries.get(id) {
            Some(open) if *open == key => (id.clone(), page),
            _ => return error(StatusCode::BAD_REQUEST, "Unknown requestId"),
        },
        (None, None) => (state.open_query(&key), 0),
        _ => return error(StatusCode::BAD_REQUEST, "requestId and page go together"),
    };

    if state.failing_pages.contains(&(key.clone(), page)) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
    }

    let entities = state.entities(&key);
    let page_size = state.page_size;
    let pages = entities.len().div_ceil(page_size).max(1);
    let start = page as usize * page_size;
    let slice: Vec<_> = entities.iter().skip(start).take(page_size).cloned().collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "limit": page_size,
            "page": page,
            "pages": pages,
            "requestId": request_id,
            "entities": slice,
        })),
    )
        .into_response()
}

/// Collection key for a request, or the error response for a malformed one.
fn collection_key(
    resource: &str,
    query: &ListQuery,
    organization: Option<&str>,
) -> Result<String, Response> {
    let scope = match resource {
        "organizations" => return Ok("organizations".to_string()),
        "users" | "collections" | "tags" | "widgets" => organization,
        "columns" | "cards" => query.widget_common_id.as_deref(),
        "tasklists" | "tasks" | "comments" => query.card_common_id.as_deref(),
        _ => return Err(error(StatusCode::NOT_FOUND, "Unknown endpoint")),
    };

    scope
        .map(|scope| MockState::key(resource, scope))
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "Missing scope for request"))
}

/// Add routing and rate-limit headers to a response.
fn decorate(state: &MockState, headers: &mut HeaderMap) {
    let mut set = |name: &'static str, value: &str| {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    };

    if let Some(backend) = &state.backend_id {
        set(BACKEND_HEADER, backend);
    }
    if let Some((remaining, reset)) = &state.rate_limit {
        set(REMAINING_HEADER, remaining);
        set(RESET_HEADER, reset);
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "message": message,
        })),
    )
        .into_response()
}
