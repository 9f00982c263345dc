//! Mock Favro API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the Favro
//! list endpoints for integration and end-to-end testing. Unlike wiremock
//! which mocks at the HTTP level per-test, this server keeps a whole
//! account in memory and pages through it the way Favro does: a
//! `requestId` per query, 0-indexed pages, a backend identifier and
//! optional rate-limit headers on every response.
//!
//! # Example
//!
//! ```ignore
//! use favro_export::mock_server::MockServer;
//! use favro_export::{ExportSession, FavroClient, FetchRequest, ResourceSource};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = FavroClient::new("me@example.com", "token", server.url()).unwrap();
//!     let mut session = ExportSession::new(client);
//!
//!     // Server comes with default fixtures
//!     let orgs = session.fetch_all(&FetchRequest::new("organizations")).await;
//!     assert_eq!(orgs.len(), 1);
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::Fixtures;
pub use server::MockServer;
pub use state::{MockState, RecordedRequest, DEFAULT_PAGE_SIZE};
