//! Record types that can anchor a cursor.

use derive_more::{Deref, DerefMut, From, IntoIterator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record whose fields can be read by name.
///
/// The pager reads the cursor field of the last raw record of every full
/// page and uses it as the anchor of the next fetch.
pub trait CursorRecord {
    /// Returns the value of `field`, if the record has one.
    fn cursor_value(&self, field: &str) -> Option<Value>;
}

impl CursorRecord for Value {
    fn cursor_value(&self, field: &str) -> Option<Value> {
        self.get(field).filter(|v| !v.is_null()).cloned()
    }
}

impl CursorRecord for Map<String, Value> {
    fn cursor_value(&self, field: &str) -> Option<Value> {
        self.get(field).filter(|v| !v.is_null()).cloned()
    }
}

impl<R: CursorRecord + ?Sized> CursorRecord for Box<R> {
    fn cursor_value(&self, field: &str) -> Option<Value> {
        (**self).cursor_value(field)
    }
}

/// A record representing a row returned by a page source.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Deref, DerefMut, From, IntoIterator,
)]
#[serde(transparent)]
#[into_iterator(owned, ref)]
pub struct Record {
    /// Column values keyed by column name.
    columns: Map<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a column value.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    /// Consumes the record and returns its columns.
    pub fn into_columns(self) -> Map<String, Value> {
        self.columns
    }
}

impl CursorRecord for Record {
    fn cursor_value(&self, field: &str) -> Option<Value> {
        self.columns.cursor_value(field)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.columns)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_value_cursor() {
        let row = json!({"id": 7, "name": "ada"});
        assert_eq!(row.cursor_value("id"), Some(json!(7)));
        assert_eq!(row.cursor_value("missing"), None);
    }

    #[test]
    fn null_is_not_a_cursor_value() {
        let row = json!({"id": null});
        assert_eq!(row.cursor_value("id"), None);
    }

    #[test]
    fn record_columns() {
        let record = Record::new().set("id", 3).set("name", "grace");
        assert_eq!(record.cursor_value("id"), Some(json!(3)));
        assert_eq!(record.get("name"), Some(&json!("grace")));
        assert_eq!(Value::from(record), json!({"id": 3, "name": "grace"}));
    }

    #[test]
    fn record_deserializes_from_object() {
        let record: Record = serde_json::from_value(json!({"id": "a1"})).unwrap();
        assert_eq!(record.cursor_value("id"), Some(json!("a1")));
    }
}
