//! Query specification accepted by a cursor stream.

use std::collections::BTreeMap;

use derive_more::{Deref, DerefMut, From};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field-selection clause: field name mapped to whether it is returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, DerefMut, From)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, bool>);

impl Selection {
    /// Creates a selection returning exactly the given fields.
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(|f| (f.into(), true)).collect())
    }

    /// Returns true if `field` is selected.
    #[inline]
    pub fn includes(&self, field: &str) -> bool {
        self.0.get(field).copied().unwrap_or(false)
    }
}

/// A bounded "find many" request used to open a cursor stream.
///
/// `filter` and `order_by` are passed through to the page source untouched.
/// `cursor` only names the cursor field through its first key; its value is
/// never used as a starting anchor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyArgs {
    /// Filter predicate understood by the page source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Fields returned for every record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Selection>,
    /// Sort clause understood by the page source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Value>,
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<usize>,
    /// Row offset. Accepted for compatibility with plain "find many" calls
    /// but overridden on every page request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    /// Cursor seed naming the cursor field (e.g. `{"created_at": null}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Map<String, Value>>,
}

impl FindManyArgs {
    /// Creates an empty query specification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter predicate.
    pub fn with_filter(mut self, filter: impl Into<Value>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the field-selection clause.
    pub fn with_select(mut self, select: impl Into<Selection>) -> Self {
        self.select = Some(select.into());
        self
    }

    /// Sets the sort clause.
    pub fn with_order_by(mut self, order_by: impl Into<Value>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Sets the page size.
    pub fn with_take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    /// Sets the row offset. Cursor streams override it.
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the cursor field by seeding the cursor object with it.
    pub fn with_cursor_field(mut self, field: impl Into<String>) -> Self {
        let mut seed = Map::new();
        seed.insert(field.into(), Value::Null);
        self.cursor = Some(seed);
        self
    }

    /// Returns the cursor field named by the seed, if any.
    ///
    /// The first key in insertion order wins.
    pub fn cursor_field(&self) -> Option<&str> {
        self.cursor
            .as_ref()
            .and_then(|seed| seed.keys().next())
            .map(String::as_str)
    }
}
