//! SwipeList lists exposed as todo lists.
//!
//! Each remote list becomes one `SwipeListTodoEntity`. Reads come from the
//! coordinator's latest snapshot; writes go straight to the client and are
//! followed by a coordinator refresh so the snapshot catches up.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use swipelist_core::config::DOMAIN;
use swipelist_core::{Item, ReqwestTransport, ShoppingList, SwipeListClient, Transport};
use tracing::debug;

use crate::coordinator::ListsCoordinator;
use crate::error::EntityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoItemStatus {
    NeedsAction,
    Completed,
}

/// A todo entry as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TodoItem {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub status: Option<TodoItemStatus>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoListFeature {
    CreateItem,
    UpdateItem,
    DeleteItem,
}

#[async_trait]
pub trait TodoListEntity: Send + Sync {
    fn unique_id(&self) -> &str;
    fn name(&self) -> &str;
    fn supported_features(&self) -> &'static [TodoListFeature];
    fn items(&self) -> Vec<TodoItem>;
    async fn create_item(&self, item: TodoItem) -> Result<(), EntityError>;
    async fn update_item(&self, item: TodoItem) -> Result<(), EntityError>;
    async fn delete_items(&self, uids: &[String]) -> Result<(), EntityError>;

    /// Reordering is not supported by the service.
    async fn move_item(&self, _uid: &str, _previous_uid: Option<&str>) -> Result<(), EntityError> {
        Ok(())
    }
}

pub struct SwipeListTodoEntity<T = ReqwestTransport> {
    client: Arc<SwipeListClient<T>>,
    coordinator: Arc<ListsCoordinator>,
    list_id: String,
    initial: ShoppingList,
    unique_id: String,
    name: String,
}

impl<T: Transport> SwipeListTodoEntity<T> {
    /// Returns `None` for lists without an id; they cannot be addressed.
    pub fn new(
        client: Arc<SwipeListClient<T>>,
        coordinator: Arc<ListsCoordinator>,
        list: ShoppingList,
    ) -> Option<Self> {
        let list_id = list.id_string()?;
        let name = list
            .name()
            .map_or_else(|| format!("List {list_id}"), str::to_string);
        Some(Self {
            client,
            coordinator,
            unique_id: format!("{DOMAIN}_{list_id}"),
            list_id,
            initial: list,
            name,
        })
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    /// The list as of the latest poll, or as first seen if it has since
    /// disappeared from the snapshot.
    fn current_list(&self) -> ShoppingList {
        self.coordinator
            .data()
            .list(&self.list_id)
            .cloned()
            .unwrap_or_else(|| self.initial.clone())
    }

    pub fn extra_state_attributes(&self) -> Map<String, Value> {
        let list = self.current_list();
        let items = list.parsed_items();
        let checked = items.iter().filter(|item| item.is_completed()).count();

        let mut attributes = Map::new();
        attributes.insert("list_id".into(), list.id().clone());
        attributes.insert("item_count".into(), json!(items.len()));
        attributes.insert("checked_count".into(), json!(checked));
        attributes.insert("unchecked_count".into(), json!(items.len() - checked));
        attributes.insert("shared_with".into(), json!(list.shared_with()));
        attributes
    }
}

#[async_trait]
impl<T: Transport + 'static> TodoListEntity for SwipeListTodoEntity<T> {
    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn supported_features(&self) -> &'static [TodoListFeature] {
        &[
            TodoListFeature::CreateItem,
            TodoListFeature::UpdateItem,
            TodoListFeature::DeleteItem,
        ]
    }

    fn items(&self) -> Vec<TodoItem> {
        self.current_list().parsed_items().iter().map(to_todo_item).collect()
    }

    async fn create_item(&self, item: TodoItem) -> Result<(), EntityError> {
        let summary = item.summary.ok_or(EntityError::MissingSummary)?;
        let (quantity, name) = split_quantity(&summary);
        debug!(list_id = %self.list_id, name, ?quantity, "creating item");
        self.client
            .add_item(&self.list_id, name, quantity.map(str::to_string), None)
            .await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    async fn update_item(&self, item: TodoItem) -> Result<(), EntityError> {
        let uid = item.uid.ok_or(EntityError::MissingUid)?;
        let checked = item.status == Some(TodoItemStatus::Completed);
        let name = item.summary.filter(|summary| !summary.is_empty());
        self.client
            .update_item(&self.list_id, &uid, Some(checked), name, None)
            .await?;
        self.coordinator.request_refresh().await;
        Ok(())
    }

    async fn delete_items(&self, uids: &[String]) -> Result<(), EntityError> {
        for uid in uids {
            self.client.delete_item(&self.list_id, uid).await?;
        }
        self.coordinator.request_refresh().await;
        Ok(())
    }
}

fn to_todo_item(item: &Item) -> TodoItem {
    let status = if item.is_completed() {
        TodoItemStatus::Completed
    } else {
        TodoItemStatus::NeedsAction
    };
    TodoItem {
        uid: Some(item.id_string().unwrap_or_default()),
        summary: Some(item.name().unwrap_or_default().to_string()),
        status: Some(status),
        description: describe(item),
    }
}

/// "Menge: 2, Kategorie: Backwaren"; `None` when neither is set.
fn describe(item: &Item) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(quantity) = item.quantity().filter(|q| !q.is_empty()) {
        parts.push(format!("Menge: {quantity}"));
    }
    if let Some(category) = item.category().filter(|c| !c.is_empty()) {
        parts.push(format!("Kategorie: {category}"));
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// Split a leading number off a summary: "2 Milch" is quantity "2" of
/// "Milch". Decimal separators are allowed in the number.
fn split_quantity(summary: &str) -> (Option<&str>, &str) {
    if let Some((head, rest)) = summary.split_once(' ') {
        let digits: String = head.chars().filter(|c| *c != ',' && *c != '.').collect();
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return (Some(head), rest);
        }
    }
    (None, summary)
}
