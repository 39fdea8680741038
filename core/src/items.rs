//! Item array normalisation and the local half of read-modify-write.
//!
//! The service embeds a list's items in the list resource, sometimes as a
//! real array and sometimes as a JSON-encoded string. Nothing here touches
//! the network; `SwipeListClient` fetches the list, calls into this module,
//! and writes the resulting array back.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use crate::types::Item;

/// Fields an item update may change. `None` leaves the field as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub checked: Option<bool>,
    pub name: Option<String>,
    pub quantity: Option<String>,
}

/// Decode a list's `items` field.
///
/// Arrays are taken as-is, every element included, strings are decoded as
/// JSON arrays, and anything else, including a string that fails to decode,
/// yields no items.
pub fn parse_items(raw: &Value) -> Vec<Item> {
    match raw {
        Value::Array(values) => values.iter().cloned().map(Item::from).collect(),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(values)) => values.into_iter().map(Item::from).collect(),
            Ok(_) => Vec::new(),
            Err(err) => {
                debug!(error = %err, "items string is not valid JSON");
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}

/// Append a new item whose id does not collide with any existing id.
pub fn append_item(
    items: &mut Vec<Item>,
    name: &str,
    quantity: Option<String>,
    category: Option<String>,
) -> Item {
    let taken: HashSet<String> = items.iter().filter_map(Item::id_string).collect();
    let mut item = Item::new(name, quantity.clone(), category.clone());
    while item.id_string().is_some_and(|id| taken.contains(&id)) {
        item = Item::new(name, quantity.clone(), category.clone());
    }
    items.push(item.clone());
    item
}

/// Apply `update` to the item whose id string-compares equal to `item_id`.
/// Returns false when no item matched; the array is then left untouched.
pub fn apply_update(items: &mut [Item], item_id: &str, update: &ItemUpdate) -> bool {
    let Some(item) = items
        .iter_mut()
        .find(|item| item.id_string().as_deref() == Some(item_id))
    else {
        return false;
    };
    if let Some(checked) = update.checked {
        item.set_checked(checked);
    }
    if let Some(name) = &update.name {
        item.set_name(name);
    }
    if let Some(quantity) = &update.quantity {
        item.set_quantity(quantity);
    }
    true
}

/// Drop every item whose id string-compares equal to `item_id`, keeping the
/// order of the rest. Returns false when nothing was removed.
pub fn remove_item(items: &mut Vec<Item>, item_id: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.id_string().as_deref() != Some(item_id));
    items.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Item> {
        parse_items(&json!([
            {"id": "1", "name": "Milk", "checked": false, "isChecked": false},
            {"id": 2, "name": "Bread", "quantity": "1"},
            {"id": "3", "name": "Eggs", "category": "Dairy"}
        ]))
    }

    #[test]
    fn parses_encoded_string() {
        let items = parse_items(&json!("[{\"id\":\"1\"}]"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id_string().as_deref(), Some("1"));
    }

    #[test]
    fn malformed_string_yields_nothing() {
        assert!(parse_items(&json!("[{\"id\":")).is_empty());
        assert!(parse_items(&json!("{\"id\":\"1\"}")).is_empty());
    }

    #[test]
    fn native_array_is_returned_unchanged() {
        let raw = json!([{"id": "1", "name": "Milk", "position": 0}, {"id": "2"}]);
        let items = parse_items(&raw);
        assert_eq!(serde_json::to_value(&items).unwrap(), raw);
    }

    #[test]
    fn other_types_yield_nothing() {
        assert!(parse_items(&json!(null)).is_empty());
        assert!(parse_items(&json!(5)).is_empty());
        assert!(parse_items(&json!({"items": []})).is_empty());
    }

    #[test]
    fn non_object_elements_are_kept() {
        let raw = json!([{"id": "1"}, "junk", 3]);
        let items = parse_items(&raw);
        assert_eq!(items.len(), 3);
        assert_eq!(serde_json::to_value(&items).unwrap(), raw);
    }

    #[test]
    fn write_back_keeps_loosely_typed_items() {
        let raw = json!([
            {"id": "x", "checked": 1},
            {"id": "y", "name": "Eggs", "category": {"id": 2, "name": "Dairy"}},
            {"id": "z", "name": 42},
            "junk"
        ]);
        let mut items = parse_items(&raw);
        append_item(&mut items, "Bread", None, None);
        assert_eq!(items.len(), 5);
        let kept = serde_json::to_value(&items[..4]).unwrap();
        assert_eq!(kept, raw);

        let update = ItemUpdate {
            checked: Some(false),
            ..Default::default()
        };
        assert!(apply_update(&mut items, "x", &update));
        assert_eq!(items[0].as_value(), &json!({"id": "x", "checked": false, "isChecked": false}));
        assert!(remove_item(&mut items, "z"));
        assert_eq!(items[2].as_value(), &json!("junk"));
    }

    #[test]
    fn append_generates_fresh_id() {
        let mut items = sample();
        let added = append_item(&mut items, "Butter", Some("250g".into()), None);
        assert_eq!(items.len(), 4);
        let ids: HashSet<String> = items.iter().filter_map(Item::id_string).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(items.last(), Some(&added));
        assert!(!added.is_completed());
    }

    #[test]
    fn update_checked_sets_both_flags_only_on_match() {
        let mut items = sample();
        let original = items.clone();
        let update = ItemUpdate {
            checked: Some(true),
            ..Default::default()
        };
        assert!(apply_update(&mut items, "2", &update));

        assert_eq!(items[1].field("checked"), Some(&json!(true)));
        assert_eq!(items[1].field("isChecked"), Some(&json!(true)));
        assert_eq!(items[1].name(), original[1].name());
        assert_eq!(items[1].quantity(), original[1].quantity());
        assert_eq!(items[0], original[0]);
        assert_eq!(items[2], original[2]);
    }

    #[test]
    fn update_unknown_id_leaves_items_untouched() {
        let mut items = sample();
        let original = items.clone();
        let update = ItemUpdate {
            name: Some("Nope".into()),
            ..Default::default()
        };
        assert!(!apply_update(&mut items, "99", &update));
        assert_eq!(items, original);
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut items = sample();
        assert!(remove_item(&mut items, "2"));
        let ids: Vec<String> = items.iter().filter_map(Item::id_string).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(!remove_item(&mut items, "2"));
    }
}
