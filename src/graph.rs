//! The Favro resource hierarchy as a small directed graph.
//!
//! Each [`ResourceKind`] knows its endpoint, the file its collection is
//! written to, the key its entities expose to their children and the edges
//! leading to those children. The traversal walks these edges instead of
//! hard-coding one loop per level.

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fetcher::FetchRequest;

/// A kind of Favro resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Organization,
    User,
    Collection,
    Tag,
    Widget,
    Column,
    Card,
    TaskList,
    Task,
    Comment,
}

/// Condition a parent entity must meet for an edge to be followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Follow the edge for every parent.
    Always,
    /// Follow the edge only if the named counter on the parent is positive.
    PositiveCount(&'static str),
}

impl Gate {
    /// Whether `parent` lets the edge through.
    pub fn allows(&self, parent: &Value) -> bool {
        match self {
            Gate::Always => true,
            Gate::PositiveCount(key) => parent.get(key).and_then(Value::as_i64).unwrap_or(0) > 0,
        }
    }
}

/// Parent-to-child dependency in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub child: ResourceKind,
    pub gate: Gate,
}

const fn always(child: ResourceKind) -> Edge {
    Edge {
        child,
        gate: Gate::Always,
    }
}

const ORGANIZATION_EDGES: &[Edge] = &[
    always(ResourceKind::User),
    always(ResourceKind::Collection),
    always(ResourceKind::Tag),
    always(ResourceKind::Widget),
];

const WIDGET_EDGES: &[Edge] = &[always(ResourceKind::Column), always(ResourceKind::Card)];

const CARD_EDGES: &[Edge] = &[
    Edge {
        child: ResourceKind::TaskList,
        gate: Gate::PositiveCount("tasksTotal"),
    },
    Edge {
        child: ResourceKind::Task,
        gate: Gate::PositiveCount("tasksTotal"),
    },
    Edge {
        child: ResourceKind::Comment,
        gate: Gate::PositiveCount("numComments"),
    },
];

impl ResourceKind {
    /// Every kind, parents before children.
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Organization,
        ResourceKind::User,
        ResourceKind::Collection,
        ResourceKind::Tag,
        ResourceKind::Widget,
        ResourceKind::Column,
        ResourceKind::Card,
        ResourceKind::TaskList,
        ResourceKind::Task,
        ResourceKind::Comment,
    ];

    /// API endpoint path, relative to the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            ResourceKind::Organization => "organizations",
            ResourceKind::User => "users",
            ResourceKind::Collection => "collections",
            ResourceKind::Tag => "tags",
            ResourceKind::Widget => "widgets",
            ResourceKind::Column => "columns",
            ResourceKind::Card => "cards",
            ResourceKind::TaskList => "tasklists",
            ResourceKind::Task => "tasks",
            ResourceKind::Comment => "comments",
        }
    }

    /// Key under which entities of this kind expose their id to children.
    pub fn id_key(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Organization => Some("organizationId"),
            ResourceKind::Widget => Some("widgetCommonId"),
            ResourceKind::Card => Some("cardCommonId"),
            _ => None,
        }
    }

    /// The kind whose entities this kind is fetched for.
    pub fn parent(&self) -> Option<ResourceKind> {
        match self {
            ResourceKind::Organization => None,
            ResourceKind::User
            | ResourceKind::Collection
            | ResourceKind::Tag
            | ResourceKind::Widget => Some(ResourceKind::Organization),
            ResourceKind::Column | ResourceKind::Card => Some(ResourceKind::Widget),
            ResourceKind::TaskList | ResourceKind::Task | ResourceKind::Comment => {
                Some(ResourceKind::Card)
            }
        }
    }

    /// Edges to the kinds fetched per entity of this kind, in fetch order.
    pub fn edges(&self) -> &'static [Edge] {
        match self {
            ResourceKind::Organization => ORGANIZATION_EDGES,
            ResourceKind::Widget => WIDGET_EDGES,
            ResourceKind::Card => CARD_EDGES,
            _ => &[],
        }
    }

    /// Id an entity of this kind passes down to its children.
    ///
    /// Ids end up in file and directory names, so only an id that is a
    /// single plain path component is returned.
    pub fn entity_id<'a>(&self, entity: &'a Value) -> Option<&'a str> {
        self.id_key()
            .and_then(|key| entity.get(key))
            .and_then(Value::as_str)
            .filter(|id| is_plain_name(id))
    }

    /// Output file for the collection fetched under `parent_id`.
    ///
    /// Organizations go to `organizations.json`; everything else is
    /// suffixed with the id of the parent it was fetched for.
    pub fn file_name(&self, parent_id: Option<&str>) -> String {
        let prefix = self.path();
        match parent_id {
            Some(id) if self.parent().is_some() => format!("{prefix}-{id}.json"),
            _ => format!("{prefix}.json"),
        }
    }

    /// The request fetching this kind for one parent.
    ///
    /// Organization-level kinds are scoped by the organization header
    /// alone; widget and card children also name their parent in the query.
    pub fn request(&self, organization: Option<&str>, parent_id: Option<&str>) -> FetchRequest {
        let mut request = FetchRequest::new(self.path());
        if let Some(org) = organization {
            request = request.organization(org);
        }

        let parent_key = match self.parent() {
            Some(parent @ (ResourceKind::Widget | ResourceKind::Card)) => parent.id_key(),
            _ => None,
        };
        if let (Some(key), Some(id)) = (parent_key, parent_id) {
            request = request.param(key, id);
        }

        request
    }
}

fn is_plain_name(id: &str) -> bool {
    if id.is_empty() || id.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == id
    )
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_names() {
        assert_eq!(ResourceKind::Organization.file_name(None), "organizations.json");
        assert_eq!(ResourceKind::User.file_name(Some("o1")), "users-o1.json");
        assert_eq!(ResourceKind::Column.file_name(Some("w1")), "columns-w1.json");
        assert_eq!(ResourceKind::TaskList.file_name(Some("c1")), "tasklists-c1.json");
        assert_eq!(ResourceKind::Comment.file_name(Some("c1")), "comments-c1.json");
    }

    #[test]
    fn test_requests_carry_parent_links() {
        let users = ResourceKind::User.request(Some("o1"), Some("o1"));
        assert_eq!(users.path, "users");
        assert_eq!(users.organization.as_deref(), Some("o1"));
        assert!(users.query.is_empty());

        let cards = ResourceKind::Card.request(Some("o1"), Some("w1"));
        assert_eq!(
            cards.query,
            vec![("widgetCommonId".to_string(), "w1".to_string())]
        );

        let tasks = ResourceKind::Task.request(Some("o1"), Some("c1"));
        assert_eq!(
            tasks.query,
            vec![("cardCommonId".to_string(), "c1".to_string())]
        );

        let organizations = ResourceKind::Organization.request(None, None);
        assert!(organizations.organization.is_none());
    }

    #[test]
    fn test_every_edge_points_back_to_its_parent() {
        for kind in ResourceKind::ALL {
            for edge in kind.edges() {
                assert_eq!(edge.child.parent(), Some(kind), "{kind} -> {}", edge.child);
            }
        }
    }

    #[test]
    fn test_card_gates() {
        let card = json!({"cardCommonId": "c1", "tasksTotal": 3, "numComments": 0});
        let gates: Vec<bool> = ResourceKind::Card
            .edges()
            .iter()
            .map(|e| e.gate.allows(&card))
            .collect();
        assert_eq!(gates, vec![true, true, false]);

        let bare = json!({"cardCommonId": "c2"});
        assert!(ResourceKind::Card.edges().iter().all(|e| !e.gate.allows(&bare)));
    }

    #[test]
    fn test_entity_id() {
        let widget = json!({"widgetCommonId": "w1", "name": "Board"});
        assert_eq!(ResourceKind::Widget.entity_id(&widget), Some("w1"));
        assert_eq!(ResourceKind::Widget.entity_id(&json!({})), None);
        assert_eq!(ResourceKind::User.entity_id(&json!({"userId": "u1"})), None);
    }

    #[test]
    fn test_entity_id_rejects_path_like_ids() {
        let card = |id: &str| json!({ "cardCommonId": id });
        for id in ["x/../../escaped", "a\\b", "..", ".", "/abs", ""] {
            assert_eq!(ResourceKind::Card.entity_id(&card(id)), None, "{id:?}");
        }
        assert_eq!(
            ResourceKind::Card.entity_id(&card("aB3x.9_k-Q")),
            Some("aB3x.9_k-Q")
        );
        assert_eq!(ResourceKind::Card.entity_id(&card("v1..2")), Some("v1..2"));
    }
}
