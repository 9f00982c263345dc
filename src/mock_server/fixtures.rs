//! Test data fixtures for the mock server.
//!
//! Provides factory functions for Favro-shaped entities. Only the linking
//! keys the exporter reads are guaranteed; the rest is realistic filler.

use serde_json::{json, Value};

use super::state::MockState;

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Organization-level fixtures
    // =========================================================================

    /// An organization.
    pub fn organization(id: &str, name: &str) -> Value {
        json!({
            "organizationId": id,
            "name": name,
            "sharedToUsers": [],
            "thumbnail": ""
        })
    }

    /// A user of an organization.
    pub fn user(id: &str, name: &str) -> Value {
        json!({
            "userId": id,
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            "organizationRole": "fullMember"
        })
    }

    /// A collection.
    pub fn collection(id: &str, name: &str) -> Value {
        json!({
            "collectionId": id,
            "organizationId": "",
            "name": name,
            "publicSharing": "organization"
        })
    }

    /// A tag.
    pub fn tag(id: &str, name: &str) -> Value {
        json!({ "tagId": id, "name": name, "color": "purple" })
    }

    /// A widget (board or backlog).
    pub fn widget(id: &str, name: &str) -> Value {
        json!({
            "widgetCommonId": id,
            "name": name,
            "type": "board",
            "collectionIds": []
        })
    }

    // =========================================================================
    // Widget-level fixtures
    // =========================================================================

    /// A column of a widget.
    pub fn column(id: &str, widget_id: &str, name: &str) -> Value {
        json!({
            "columnId": id,
            "widgetCommonId": widget_id,
            "name": name,
            "position": 0
        })
    }

    /// A card with its task and comment counters.
    pub fn card(id: &str, widget_id: &str, tasks_total: u32, num_comments: u32) -> Value {
        json!({
            "cardId": format!("{id}-instance"),
            "cardCommonId": id,
            "widgetCommonId": widget_id,
            "name": format!("Card {id}"),
            "tasksTotal": tasks_total,
            "tasksDone": 0,
            "numComments": num_comments,
            "attachments": []
        })
    }

    /// A card carrying attachments.
    pub fn card_with_attachments(id: &str, widget_id: &str, attachments: Vec<Value>) -> Value {
        let mut card = Self::card(id, widget_id, 0, 0);
        card["attachments"] = Value::Array(attachments);
        card
    }

    /// An attachment entry as listed on a card.
    pub fn attachment(name: &str, file_url: &str) -> Value {
        json!({ "name": name, "fileURL": file_url })
    }

    // =========================================================================
    // Card-level fixtures
    // =========================================================================

    /// A task list of a card.
    pub fn task_list(id: &str, card_id: &str) -> Value {
        json!({ "taskListId": id, "cardCommonId": card_id, "name": "Checklist" })
    }

    /// A task of a card.
    pub fn task(id: &str, card_id: &str, task_list_id: &str) -> Value {
        json!({
            "taskId": id,
            "taskListId": task_list_id,
            "cardCommonId": card_id,
            "name": format!("Task {id}"),
            "completed": false
        })
    }

    /// A comment on a card.
    pub fn comment(id: &str, card_id: &str, comment: &str) -> Value {
        json!({ "commentId": id, "cardCommonId": card_id, "comment": comment })
    }

    // =========================================================================
    // Scenario
    // =========================================================================

    /// A small account: one organization with two users, one collection,
    /// one tag and one widget holding a single card with three tasks in one
    /// task list and no comments.
    pub fn default_account() -> MockState {
        MockState::new()
            .with_backend_id("backend-7")
            .with_organization(Self::organization("org-1", "Acme"))
            .with_entities(
                "users",
                "org-1",
                vec![Self::user("user-1", "Ada Admin"), Self::user("user-2", "Bob Member")],
            )
            .with_entities("collections", "org-1", vec![Self::collection("col-1", "Product")])
            .with_entities("tags", "org-1", vec![Self::tag("tag-1", "urgent")])
            .with_entities("widgets", "org-1", vec![Self::widget("widget-1", "Roadmap")])
            .with_entities(
                "columns",
                "widget-1",
                vec![Self::column("column-1", "widget-1", "Todo")],
            )
            .with_entities("cards", "widget-1", vec![Self::card("card-1", "widget-1", 3, 0)])
            .with_entities("tasklists", "card-1", vec![Self::task_list("tl-1", "card-1")])
            .with_entities(
                "tasks",
                "card-1",
                (1..=3)
                    .map(|i| Self::task(&format!("task-{i}"), "card-1", "tl-1"))
                    .collect(),
            )
    }
}
