//! The immutable JSON document model.
//!
//! A [`JsValue`] tree is created once, by the parser or by the encode path,
//! and is read-only thereafter. Objects preserve insertion order, which keeps
//! printed output diff-stable and witness placement deterministic.

mod decimal;
mod number;

pub use decimal::Decimal;
pub use number::Number;

use indexmap::IndexMap;

/// Insertion-ordered object representation. Duplicate keys at parse time keep
/// the first insertion position; the last value wins.
pub type JsObject = IndexMap<String, JsValue>;

/// An immutable JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JsValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<JsValue>),
    Object(JsObject),
}

impl JsValue {
    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            JsValue::Null => "null",
            JsValue::Bool(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Array(_) => "array",
            JsValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            JsValue::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsValue]> {
        match self {
            JsValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            JsValue::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Looks up an object entry by key. Returns `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<&JsValue> {
        self.as_object().and_then(|object| object.get(key))
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        JsValue::Bool(value)
    }
}

impl From<i64> for JsValue {
    fn from(value: i64) -> Self {
        JsValue::Number(Number::Int(value))
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        JsValue::String(value.to_string())
    }
}

impl From<String> for JsValue {
    fn from(value: String) -> Self {
        JsValue::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_preserves_insertion_order() {
        let mut object = JsObject::new();
        object.insert("z".into(), JsValue::from(1));
        object.insert("a".into(), JsValue::from(2));
        object.insert("m".into(), JsValue::from(3));
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn duplicate_insert_keeps_position_and_replaces_value() {
        let mut object = JsObject::new();
        object.insert("a".into(), JsValue::from(1));
        object.insert("b".into(), JsValue::from(2));
        object.insert("a".into(), JsValue::from(3));
        let entries: Vec<(&str, &JsValue)> = object
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        assert_eq!(entries[0], ("a", &JsValue::from(3)));
        assert_eq!(entries[1], ("b", &JsValue::from(2)));
    }

    #[test]
    fn get_traverses_objects_only() {
        let mut object = JsObject::new();
        object.insert("a".into(), JsValue::from("x"));
        let value = JsValue::Object(object);
        assert_eq!(value.get("a").and_then(JsValue::as_str), Some("x"));
        assert_eq!(JsValue::Null.get("a"), None);
    }
}
