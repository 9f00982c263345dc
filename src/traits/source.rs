//! Source of paginated entity collections.

use async_trait::async_trait;

use crate::fetcher::FetchRequest;
use crate::pagination::EntityCollection;

/// Fetch every entity of a logical query.
///
/// Implementations are fail-soft: they never error, and on failure return
/// whatever prefix of the result they obtained with
/// [`EntityCollection::truncated`] set.
///
/// # Example
///
/// ```ignore
/// use favro_export::{ExportSession, FavroClient, FetchRequest, ResourceSource};
///
/// let mut session = ExportSession::new(FavroClient::from_env()?);
/// let organizations = session.fetch_all(&FetchRequest::new("organizations")).await;
/// ```
#[async_trait]
pub trait ResourceSource: Send {
    /// Fetch all pages of `request`, in page order.
    async fn fetch_all(&mut self, request: &FetchRequest) -> EntityCollection;
}
