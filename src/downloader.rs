//! Attachment downloads.
//!
//! Cards list their attachments as `{ "name", "fileURL" }` pairs. Each
//! card's files land in their own `attachments-<cardCommonId>` directory;
//! every entry is attempted independently and a failure never stops the
//! remaining ones. Entries that cannot be parsed count as failed files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ExportError, Result};

/// Connect timeout for attachment requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read timeout for attachment requests.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("favro-export/", env!("CARGO_PKG_VERSION"));

/// A file attached to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as shown in Favro.
    pub name: String,
    /// Download URL.
    #[serde(rename = "fileURL")]
    pub file_url: String,
}

impl Attachment {
    /// Attachment entries listed on a card entity, in card order.
    ///
    /// An entry missing its name or URL is kept as an
    /// [`ExportError::InvalidAttachment`] so the download counts it as failed.
    pub fn from_card(card: &Value) -> Vec<Result<Attachment>> {
        let Some(entries) = card.get("attachments").and_then(Value::as_array) else {
            return Vec::new();
        };

        entries
            .iter()
            .map(|entry| {
                Attachment::deserialize(entry)
                    .map_err(|e| ExportError::InvalidAttachment(format!("{entry} ({e})")))
            })
            .collect()
    }

    /// Name to store the file under: the last path component of `name`.
    pub fn file_name(&self) -> Result<&str> {
        Path::new(&self.name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ExportError::InvalidAttachment(self.name.clone()))
    }
}

/// Outcome of downloading one card's attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    /// Files a download was attempted for.
    pub attempted: usize,
    /// Files written to disk.
    pub downloaded: usize,
    /// Files that failed.
    pub failed: usize,
    /// Whether the card's directory could not be created.
    pub directory_failed: bool,
}

impl DownloadReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: DownloadReport) {
        self.attempted += other.attempted;
        self.downloaded += other.downloaded;
        self.failed += other.failed;
        self.directory_failed |= other.directory_failed;
    }
}

/// Downloads card attachments with bounded timeouts and no retries.
#[derive(Debug, Clone)]
pub struct AttachmentDownloader {
    http: Client,
}

impl AttachmentDownloader {
    /// Create a downloader with 30 second connect and read timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .map_err(ExportError::HttpError)?;

        Ok(Self { http })
    }

    /// Directory holding a card's attachments.
    pub fn card_dir(dest: &Path, card_id: &str) -> PathBuf {
        dest.join(format!("attachments-{card_id}"))
    }

    /// Download every attachment of a card into `attachments-<card_id>`.
    ///
    /// Does nothing for an empty list. If the directory cannot be created no
    /// download is attempted. A malformed entry is attempted and fails.
    #[tracing::instrument(skip(self, dest, attachments), fields(count = attachments.len()))]
    pub async fn download_all(
        &self,
        dest: &Path,
        card_id: &str,
        attachments: &[Result<Attachment>],
    ) -> DownloadReport {
        let mut report = DownloadReport::default();
        if attachments.is_empty() {
            return report;
        }

        let dir = Self::card_dir(dest, card_id);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::error!(
                card_id,
                dir = %dir.display(),
                error = %e,
                "could not create attachment directory"
            );
            report.directory_failed = true;
            return report;
        }

        for entry in attachments {
            report.attempted += 1;
            let attachment = match entry {
                Ok(attachment) => attachment,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(card_id, error = %e, "could not download attachment");
                    continue;
                }
            };

            match self.download(&dir, attachment).await {
                Ok(path) => {
                    report.downloaded += 1;
                    tracing::info!(card_id, file = %path.display(), "exported attachment");
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        card_id,
                        url = %attachment.file_url,
                        name = %attachment.name,
                        error = %e,
                        "could not download attachment"
                    );
                }
            }
        }

        report
    }

    /// Fetch one attachment and write it into `dir`.
    async fn download(&self, dir: &Path, attachment: &Attachment) -> Result<PathBuf> {
        let path = dir.join(attachment.file_name()?);

        let response = self
            .http
            .get(&attachment.file_url)
            .send()
            .await
            .map_err(ExportError::HttpError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::DownloadFailed {
                url: attachment.file_url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(ExportError::HttpError)?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ExportError::io(&path, e))?;

        Ok(path)
    }
}
