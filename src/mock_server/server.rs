//! Mock Favro API server.
//!
//! Provides an axum-based HTTP server that simulates the Favro API.

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;

/// A mock Favro API server for testing.
///
/// The server runs in the background and can be used to test the exporter
/// against a realistic API implementation.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with the default account.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_account()).await
    }

    /// Start a mock server with an empty account.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Use this URL when creating a `FavroClient` for testing.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL under which a file added with [`MockState::with_file`] is served.
    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{}", self.url, urlencoding::encode(name))
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the axum router with all routes.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            // Attachment files
            .route("/files/:name", get(handlers::get_file))
            // Health check
            .route("/health", get(health_check))
            // Every paginated list endpoint
            .route("/:resource", get(handlers::list_entities))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExportSession, FavroClient, FetchRequest, ResourceSource};
    use serde_json::json;

    fn session(server: &MockServer) -> ExportSession {
        ExportSession::new(FavroClient::new("me@example.com", "token", server.url()).unwrap())
    }

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_organizations_with_session() {
        let server = MockServer::start().await;
        let mut session = session(&server);

        let organizations = session
            .fetch_all(&FetchRequest::new("organizations"))
            .await;

        assert_eq!(organizations.len(), 1);
        assert!(!organizations.truncated);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_pages_through_collection() {
        let users: Vec<_> = (0..5).map(|i| json!({"userId": format!("u{i}")})).collect();
        let state = MockState::new()
            .with_page_size(2)
            .with_entities("users", "o1", users);
        let server = MockServer::with_state(state).await;
        let mut session = session(&server);

        let fetched = session
            .fetch_all(&FetchRequest::new("users").organization("o1"))
            .await;

        assert_eq!(fetched.len(), 5);
        assert_eq!(fetched.pages_fetched, 3);

        let state = server.state();
        let state = state.read().await;
        let pages: Vec<_> = state.requests.iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![None, Some(1), Some(2)]);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_scoped_endpoint_without_scope_is_rejected() {
        let server = MockServer::start_empty().await;
        let mut session = session(&server);

        let fetched = session.fetch_all(&FetchRequest::new("cards")).await;

        assert!(fetched.is_empty());
        assert!(fetched.truncated);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_file_route() {
        let state = MockState::new().with_file("notes v2.txt", "hello");
        let server = MockServer::with_state(state).await;

        let body = reqwest::get(server.file_url("notes v2.txt"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "hello");

        let missing = reqwest::get(server.file_url("gone.txt")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        server.shutdown().await;
    }
}
