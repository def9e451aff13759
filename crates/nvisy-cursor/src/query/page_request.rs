//! Per-page fetch parameters handed to a page source.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::{FindManyArgs, Selection};

/// Resume position of a stream: `{ <field>: <value> }`.
///
/// Page sources treat the anchor as inclusive, which is why every anchored
/// request also carries `skip = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorAnchor {
    /// Cursor field name.
    pub field: String,
    /// Value of the cursor field on the last record already emitted.
    pub value: Value,
}

impl CursorAnchor {
    /// Creates a new anchor.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

impl Serialize for CursorAnchor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

/// Parameters of a single page fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Filter predicate copied from the query specification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Field selection copied from the query specification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Selection>,
    /// Sort clause copied from the query specification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Value>,
    /// Maximum number of records to return.
    pub take: usize,
    /// Number of records to skip, counted from the anchor when one is set.
    pub skip: usize,
    /// Anchor of the request, absent on the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<CursorAnchor>,
}

impl PageRequest {
    /// Builds the request for the next page of `args`.
    ///
    /// The query's own `skip` is ignored: `0` without an anchor, `1` with one.
    pub(crate) fn next(
        args: &FindManyArgs,
        take: usize,
        cursor: Option<CursorAnchor>,
    ) -> Self {
        let skip = if cursor.is_some() { 1 } else { 0 };
        Self {
            filter: args.filter.clone(),
            select: args.select.clone(),
            order_by: args.order_by.clone(),
            take,
            skip,
            cursor,
        }
    }

    /// Returns true if the request resumes from an anchor.
    #[inline]
    pub fn is_anchored(&self) -> bool {
        self.cursor.is_some()
    }

    /// Returns the anchor value, if any.
    pub fn cursor_value(&self) -> Option<&Value> {
        self.cursor.as_ref().map(|anchor| &anchor.value)
    }
}
