//! Domain DTOs for the SwipeList API.
//!
//! # Design
//! The service is loose about its schema: ids arrive as numbers or strings,
//! a list's `items` may be an array or a JSON-encoded string, the checked
//! state is reported under both `checked` and `isChecked`, and item fields
//! are not always the type one would expect. Lists and items therefore wrap
//! the JSON exactly as it was read and expose typed accessors over it. A
//! read-modify-write sends back every element and every field it read,
//! changed only where a setter wrote.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::items::parse_items;

/// Render an id the way the service compares them: strings verbatim, numbers
/// in decimal. `null` has no string form.
pub fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Loose truthiness: `false`, `0`, `""`, `null` and empty containers are
/// false, everything else is true.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(values) => !values.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Strings verbatim, numbers in decimal, an object by its `name`.
fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// A shopping list as returned by `GET /lists` and `GET /lists/{id}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShoppingList {
    raw: Value,
}

impl ShoppingList {
    pub fn id(&self) -> &Value {
        self.field("id").unwrap_or(&Value::Null)
    }

    pub fn id_string(&self) -> Option<String> {
        id_to_string(self.id())
    }

    /// The name, if the server sent one as a string.
    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(Value::as_str)
    }

    /// Items as sent: an array, the same array JSON-encoded as a string, or
    /// `null` when missing.
    pub fn items_raw(&self) -> &Value {
        self.field("items").unwrap_or(&Value::Null)
    }

    /// Items in normalized form, whichever encoding the server used.
    pub fn parsed_items(&self) -> Vec<Item> {
        parse_items(self.items_raw())
    }

    /// Users the list is shared with. Empty when absent or not an array.
    pub fn shared_with(&self) -> &[Value] {
        self.field("sharedWith")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }
}

impl From<Value> for ShoppingList {
    fn from(raw: Value) -> Self {
        Self { raw }
    }
}

/// A single element of a list's items array.
///
/// Usually an object, but whatever the server stored is kept as is; the
/// accessors read as absent on anything that is not an object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item {
    raw: Value,
}

impl Item {
    /// A fresh unchecked item with a client-generated UUID.
    pub fn new(name: &str, quantity: Option<String>, category: Option<String>) -> Self {
        let mut object = Map::new();
        object.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        object.insert("name".into(), Value::String(name.to_string()));
        object.insert("checked".into(), Value::Bool(false));
        object.insert("isChecked".into(), Value::Bool(false));
        if let Some(quantity) = quantity {
            object.insert("quantity".into(), Value::String(quantity));
        }
        if let Some(category) = category {
            object.insert("category".into(), Value::String(category));
        }
        Self {
            raw: Value::Object(object),
        }
    }

    pub fn id(&self) -> &Value {
        self.field("id").unwrap_or(&Value::Null)
    }

    pub fn id_string(&self) -> Option<String> {
        id_to_string(self.id())
    }

    /// The name, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.field("name").and_then(Value::as_str)
    }

    pub fn quantity(&self) -> Option<String> {
        self.field("quantity").and_then(display_text)
    }

    pub fn category(&self) -> Option<String> {
        self.field("category").and_then(display_text)
    }

    /// Either checked flag counts, by truthiness.
    pub fn is_completed(&self) -> bool {
        ["checked", "isChecked"]
            .iter()
            .any(|key| self.field(key).is_some_and(truthy))
    }

    /// Writes always set both flags so either reader sees the same state.
    pub fn set_checked(&mut self, checked: bool) {
        self.set("checked", Value::Bool(checked));
        self.set("isChecked", Value::Bool(checked));
    }

    pub fn set_name(&mut self, name: &str) {
        self.set("name", Value::String(name.to_string()));
    }

    pub fn set_quantity(&mut self, quantity: &str) {
        self.set("quantity", Value::String(quantity.to_string()));
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    /// No-op on elements that are not objects.
    fn set(&mut self, key: &str, value: Value) {
        if let Value::Object(object) = &mut self.raw {
            object.insert(key.to_string(), value);
        }
    }
}

impl From<Value> for Item {
    fn from(raw: Value) -> Self {
        Self { raw }
    }
}

/// Raw body of a successful `POST /auth/login` or `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionInfo {
    pub raw: Value,
}

impl SessionInfo {
    /// The access token, reported as `token` or `accessToken`.
    pub fn access_token(&self) -> Option<&str> {
        self.non_empty("token").or_else(|| self.non_empty("accessToken"))
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.non_empty("refreshToken")
    }

    pub fn user_id(&self) -> Option<String> {
        self.raw.get("user").and_then(|user| user.get("id")).and_then(id_to_string)
    }

    pub fn user_email(&self) -> Option<&str> {
        self.raw
            .get("user")
            .and_then(|user| user.get("email"))
            .and_then(Value::as_str)
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.raw
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Request payload for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request payload for `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Request payload for `POST /lists`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateList {
    pub name: String,
}

/// Request payload for `PUT /lists/{id}`. The service has no per-item
/// endpoint, so the whole array is replaced on every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceItems {
    pub items: Vec<Item>,
}
