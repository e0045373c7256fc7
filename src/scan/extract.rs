//! Finds the line items in a decoded QR payload.
//!
//! QR codes from different vendors nest their line items in different ways,
//! so the payload is searched for anything that looks like an item instead
//! of being parsed against a fixed schema.

use serde_json::{Map, Value};

/// A JSON object that looks like a purchased item, before its fields are checked.
///
/// The values are copied from the payload as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
    /// The `name` value of the object.
    pub name: Value,
    /// The `price` value of the object.
    pub price: Value,
    /// The `quantity` value of the object, or `1` when it has no quantity.
    pub quantity: Value,
}

impl CandidateItem {
    /// Create a candidate from an object if it has both a `name` and a `price` key.
    fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let name = object.get("name")?;
        let price = object.get("price")?;
        let quantity = match object.get("quantity") {
            None | Some(Value::Null) => Value::from(1),
            Some(quantity) => quantity.clone(),
        };

        Some(Self {
            name: name.clone(),
            price: price.clone(),
            quantity,
        })
    }
}

/// Find every object in `payload` that has a `name` and a `price`.
///
/// The payload is walked depth first. An object is emitted before any item
/// nested inside it, array elements are visited in order and object values are
/// visited in the order their keys appear in the payload. Objects that are
/// items are still searched for nested items.
pub fn extract_items(payload: &Value) -> Vec<CandidateItem> {
    match payload {
        Value::Array(values) => values.iter().flat_map(extract_items).collect(),
        Value::Object(object) => CandidateItem::from_object(object)
            .into_iter()
            .chain(object.values().flat_map(extract_items))
            .collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Vec::new(),
    }
}
