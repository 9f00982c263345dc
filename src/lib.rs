//! Favro account exporter.
//!
//! Walks every organization of a Favro account through the paginated REST
//! API, writing each collection it discovers to a JSON file and
//! downloading card attachments alongside.
//!
//! # Quick Start
//!
//! ```no_run
//! use favro_export::{AttachmentDownloader, ExportSession, Exporter, FavroClient, JsonSink};
//!
//! #[tokio::main]
//! async fn main() -> favro_export::Result<()> {
//!     // Create client from environment variables
//!     let client = FavroClient::from_env()?;
//!
//!     // Prepare an empty destination directory
//!     let dest = std::path::Path::new("favro-backup");
//!     favro_export::prepare_destination(dest, true).await?;
//!
//!     // Export everything
//!     let session = ExportSession::new(client);
//!     let mut exporter = Exporter::new(session, JsonSink::new(dest), AttachmentDownloader::new()?);
//!     let summary = exporter.run().await;
//!     println!("complete: {}", summary.is_complete());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`RequestPacer`] - waits out exhausted rate-limit windows
//! - [`fetch_all`] - reads every page of one query into an [`EntityCollection`]
//! - [`AttachmentDownloader`] - stores a card's files under `attachments-<cardId>`
//! - [`JsonSink`] - writes collections as pretty-printed JSON
//! - [`Exporter`] - walks the [`ResourceKind`] graph, threading ids downward
//!
//! All mutable state of a run (backend affinity, pending rate-limit wait)
//! lives in one [`ExportSession`] that is passed by reference into every
//! fetch. Requests are strictly sequential.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `FAVRO_USER` (required) - Account email
//! - `FAVRO_API_TOKEN` (required) - API token
//! - `FAVRO_API_URL` (optional) - Base URL (defaults to `https://favro.com/api/v1`)

pub mod cli;
mod client;
mod downloader;
mod error;
mod fetcher;
mod graph;
mod pacer;
mod pagination;
mod session;
mod sink;
mod traits;
mod traversal;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::{FavroClient, BACKEND_HEADER, DEFAULT_API_URL, ORGANIZATION_HEADER};
pub use error::{ExportError, Result};
pub use pacer::{RequestPacer, REMAINING_HEADER, RESET_HEADER};
pub use pagination::{EntityCollection, PageCursor, PageEnvelope};
pub use session::ExportSession;

// Re-export traits
pub use traits::ResourceSource;

// Re-export export components
pub use downloader::{Attachment, AttachmentDownloader, DownloadReport};
pub use fetcher::{fetch_all, FetchRequest};
pub use graph::{Edge, Gate, ResourceKind};
pub use sink::{prepare_destination, JsonSink};
pub use traversal::{ExportSummary, Exporter, KindStats};
