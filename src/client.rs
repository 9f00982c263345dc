//! Favro API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Pagination, pacing and backend affinity live in the session and fetcher.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::error::{ExportError, Result};

/// Default base URL of the public Favro API.
pub const DEFAULT_API_URL: &str = "https://favro.com/api/v1";

/// Header scoping a request to one organization (`organizationId`).
///
/// Header names are case-insensitive; they are kept lowercase so they can
/// be used directly as `HeaderName`s.
pub const ORGANIZATION_HEADER: &str = "organizationid";

/// Header carrying the backend shard identifier, in both directions
/// (`X-Favro-Backend-Identifier`).
pub const BACKEND_HEADER: &str = "x-favro-backend-identifier";

const USER_AGENT: &str = concat!("favro-export/", env!("CARGO_PKG_VERSION"));

/// Status codes treated as a successful page response.
const ACCEPTED_STATUSES: [StatusCode; 4] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
];

/// Low-level Favro API client.
///
/// Every request carries Basic authentication built from the account
/// email and API token. This struct is cheaply cloneable; clones reference
/// the same underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use favro_export::FavroClient;
///
/// # fn example() -> favro_export::Result<()> {
/// // Create from environment variables
/// let client = FavroClient::from_env()?;
///
/// // Or configure manually
/// let client = FavroClient::new("me@example.com", "api-token", "https://favro.com/api/v1")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FavroClient {
    http: Client,
    base_url: Arc<Url>,
    user: String,
    token: String,
}

impl std::fmt::Debug for FavroClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavroClient")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl FavroClient {
    /// Create a client from environment variables.
    ///
    /// Uses `FAVRO_USER` and `FAVRO_API_TOKEN` for authentication and
    /// optionally `FAVRO_API_URL` for the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential variable is not set.
    pub fn from_env() -> Result<Self> {
        let user = env::var("FAVRO_USER").map_err(|_| {
            ExportError::ConfigMissing("FAVRO_USER environment variable not set".to_string())
        })?;
        let token = env::var("FAVRO_API_TOKEN").map_err(|_| {
            ExportError::ConfigMissing("FAVRO_API_TOKEN environment variable not set".to_string())
        })?;

        let base_url = env::var("FAVRO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self::new(&user, &token, &base_url)
    }

    /// Create a new client with the provided credentials and base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(user: &str, token: &str, base_url: &str) -> Result<Self> {
        // Ensure base URL ends with / so relative joins keep the api prefix
        let base_url_str = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        let base_url = Url::parse(&base_url_str)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(ExportError::HttpError)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            user: user.to_string(),
            token: token.to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make an authenticated GET request.
    ///
    /// The response is returned whatever its status, so the caller can
    /// read routing and rate-limit headers before judging it with
    /// [`FavroClient::check_response`].
    #[tracing::instrument(skip(self, headers, query), fields(url = tracing::field::Empty))]
    pub async fn get(
        &self,
        path: &str,
        headers: HeaderMap,
        query: &[(String, String)],
    ) -> Result<Response> {
        let url = self.base_url.join(path)?;
        tracing::Span::current().record("url", url.as_str());

        self.http
            .get(url)
            .basic_auth(&self.user, Some(&self.token))
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(ExportError::HttpError)
    }

    /// Check response status and convert errors.
    pub async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();

        if ACCEPTED_STATUSES.contains(&status) {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let reset_at = response
                .headers()
                .get(crate::pacer::RESET_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(crate::pacer::parse_reset);
            return Err(ExportError::RateLimited { reset_at });
        }

        let message = Self::extract_error_message(response, status).await;
        Err(ExportError::ApiError {
            message,
            status_code: Some(status.as_u16()),
        })
    }

    /// Extract error message from a failed response.
    async fn extract_error_message(response: Response, status: StatusCode) -> String {
        let body = match response.text().await {
            Ok(b) if !b.trim().is_empty() => b,
            _ => return format!("HTTP {status}"),
        };

        // Try to parse as JSON and extract message field
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
                return msg.to_string();
            }
            if let Some(err) = json.get("error").and_then(|m| m.as_str()) {
                return err.to_string();
            }
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug() {
        let client = FavroClient::new("me@example.com", "secret-token", DEFAULT_API_URL).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("FavroClient"));
        assert!(debug.contains("base_url"));
        // Token should not be in debug output
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client1 = FavroClient::new("u", "t", "https://favro.com/api/v1").unwrap();
        let client2 = FavroClient::new("u", "t", "https://favro.com/api/v1/").unwrap();
        assert_eq!(client1.base_url().as_str(), client2.base_url().as_str());
        assert_eq!(
            client1.base_url().join("cards").unwrap().as_str(),
            "https://favro.com/api/v1/cards"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = FavroClient::new("u", "t", "not a url");
        assert!(matches!(result, Err(ExportError::UrlError(_))));
    }
}
