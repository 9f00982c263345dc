//! Depth-first export of the whole resource hierarchy.
//!
//! The exporter keeps an explicit stack of pending steps. Fetching a
//! collection persists it and pushes one step per child edge of every
//! entity, in reverse so they pop in document order. The visit order is
//! therefore: organizations; per organization its users, collections, tags
//! and widgets; per widget its columns and cards; per card its attachments,
//! task lists, tasks and comments.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::downloader::{Attachment, AttachmentDownloader, DownloadReport};
use crate::error::Result;
use crate::graph::ResourceKind;
use crate::pagination::EntityCollection;
use crate::sink::JsonSink;
use crate::traits::ResourceSource;

/// A unit of pending work.
#[derive(Debug)]
enum Step {
    /// Fetch and persist one collection.
    Fetch {
        kind: ResourceKind,
        organization: Option<String>,
        parent_id: Option<String>,
    },
    /// Download a card's attachments.
    Attachments {
        card_id: String,
        attachments: Vec<Result<Attachment>>,
    },
}

/// Counters for one resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindStats {
    /// Paginated fetches issued.
    pub fetches: usize,
    /// Entities received.
    pub entities: usize,
    /// Fetches cut short by a failure.
    pub truncated: usize,
    /// Collection files written.
    pub files_written: usize,
    /// Collection files that could not be written.
    pub write_failures: usize,
}

/// What one export run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Counters per resource kind.
    pub kinds: BTreeMap<ResourceKind, KindStats>,
    /// Attachment totals across all cards.
    pub attachments: DownloadReport,
    /// Cards whose attachment directory could not be created.
    pub attachment_dir_failures: usize,
}

impl ExportSummary {
    /// Counters for `kind` (zero if never fetched).
    pub fn stats(&self, kind: ResourceKind) -> KindStats {
        self.kinds.get(&kind).copied().unwrap_or_default()
    }

    /// Whether every fetch, write and download succeeded.
    pub fn is_complete(&self) -> bool {
        self.kinds
            .values()
            .all(|s| s.truncated == 0 && s.write_failures == 0)
            && self.attachments.failed == 0
            && self.attachment_dir_failures == 0
    }

    fn record_fetch(&mut self, kind: ResourceKind, collection: &EntityCollection) {
        let stats = self.kinds.entry(kind).or_default();
        stats.fetches += 1;
        stats.entities += collection.len();
        if collection.truncated {
            stats.truncated += 1;
        }
    }

    fn record_write(&mut self, kind: ResourceKind, ok: bool) {
        let stats = self.kinds.entry(kind).or_default();
        if ok {
            stats.files_written += 1;
        } else {
            stats.write_failures += 1;
        }
    }

    fn record_attachments(&mut self, report: DownloadReport) {
        if report.directory_failed {
            self.attachment_dir_failures += 1;
        }
        self.attachments.merge(report);
    }
}

/// Walks the Favro hierarchy, persisting every collection it finds.
///
/// # Example
///
/// ```no_run
/// use favro_export::{AttachmentDownloader, ExportSession, Exporter, FavroClient, JsonSink};
///
/// # async fn example() -> favro_export::Result<()> {
/// let session = ExportSession::new(FavroClient::from_env()?);
/// let mut exporter = Exporter::new(session, JsonSink::new("export"), AttachmentDownloader::new()?);
/// let summary = exporter.run().await;
/// println!("{} organizations", summary.stats(favro_export::ResourceKind::Organization).entities);
/// # Ok(())
/// # }
/// ```
pub struct Exporter<S> {
    source: S,
    sink: JsonSink,
    downloader: AttachmentDownloader,
    organization_filter: Option<String>,
}

impl<S: ResourceSource> Exporter<S> {
    /// Create an exporter writing through `sink`.
    pub fn new(source: S, sink: JsonSink, downloader: AttachmentDownloader) -> Self {
        Self {
            source,
            sink,
            downloader,
            organization_filter: None,
        }
    }

    /// Only descend into the organization with this id.
    ///
    /// `organizations.json` still lists every organization.
    #[must_use]
    pub fn only_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_filter = Some(organization_id.into());
        self
    }

    /// The source the exporter fetches from.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Consume the exporter, returning its source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Export everything reachable from the account's organizations.
    ///
    /// Always runs to completion; failures are logged and counted in the
    /// returned summary.
    pub async fn run(&mut self) -> ExportSummary {
        let mut summary = ExportSummary::default();
        let mut stack = vec![Step::Fetch {
            kind: ResourceKind::Organization,
            organization: None,
            parent_id: None,
        }];

        while let Some(step) = stack.pop() {
            match step {
                Step::Fetch {
                    kind,
                    organization,
                    parent_id,
                } => {
                    let children = self
                        .export_collection(kind, organization, parent_id, &mut summary)
                        .await;
                    // Reverse so the first child pops first
                    stack.extend(children.into_iter().rev());
                }
                Step::Attachments {
                    card_id,
                    attachments,
                } => {
                    let report = self
                        .downloader
                        .download_all(self.sink.dir(), &card_id, &attachments)
                        .await;
                    summary.record_attachments(report);
                }
            }
        }

        tracing::info!(
            complete = summary.is_complete(),
            attachments = summary.attachments.downloaded,
            "export finished"
        );
        summary
    }

    /// Fetch and persist one collection, returning the steps for its
    /// entities' children in visit order.
    async fn export_collection(
        &mut self,
        kind: ResourceKind,
        organization: Option<String>,
        parent_id: Option<String>,
        summary: &mut ExportSummary,
    ) -> Vec<Step> {
        let request = kind.request(organization.as_deref(), parent_id.as_deref());
        let collection = self.source.fetch_all(&request).await;
        summary.record_fetch(kind, &collection);

        let file_name = kind.file_name(parent_id.as_deref());
        let written = self.persist(&file_name, &collection).await;
        summary.record_write(kind, written.is_some());
        if written.is_some() {
            tracing::info!(
                kind = %kind,
                parent = parent_id.as_deref().unwrap_or("-"),
                count = collection.len(),
                file = %file_name,
                "exported"
            );
        }

        let mut steps = Vec::new();
        for entity in collection.iter() {
            steps.extend(self.child_steps(kind, entity, organization.as_deref()));
        }
        steps
    }

    async fn persist(&self, file_name: &str, collection: &EntityCollection) -> Option<PathBuf> {
        match self.sink.write(file_name, &collection.entities).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(file = file_name, error = %e, "could not write export file");
                None
            }
        }
    }

    /// Steps triggered by one entity, following its kind's edges.
    fn child_steps(
        &self,
        kind: ResourceKind,
        entity: &Value,
        organization: Option<&str>,
    ) -> Vec<Step> {
        let edges = kind.edges();
        if edges.is_empty() {
            return Vec::new();
        }

        let Some(id) = kind.entity_id(entity) else {
            let key = kind.id_key().unwrap_or_default();
            tracing::warn!(
                kind = %kind,
                key,
                value = %entity.get(key).unwrap_or(&serde_json::Value::Null),
                "entity has no usable id, skipping its children"
            );
            return Vec::new();
        };

        // Children of an organization are scoped to that organization
        let organization = if kind == ResourceKind::Organization {
            if let Some(only) = &self.organization_filter {
                if only.as_str() != id {
                    tracing::debug!(organization = id, "skipping filtered organization");
                    return Vec::new();
                }
            }
            Some(id)
        } else {
            organization
        };

        let mut steps = Vec::new();

        if kind == ResourceKind::Card {
            let attachments = Attachment::from_card(entity);
            if !attachments.is_empty() {
                steps.push(Step::Attachments {
                    card_id: id.to_string(),
                    attachments,
                });
            }
        }

        for edge in edges {
            if !edge.gate.allows(entity) {
                continue;
            }
            steps.push(Step::Fetch {
                kind: edge.child,
                organization: organization.map(str::to_string),
                parent_id: Some(id.to_string()),
            });
        }

        steps
    }
}
