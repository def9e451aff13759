//! In-memory table page source.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Map, Number, Value};

use crate::error::BoxedError;
use crate::query::PageRequest;
use crate::record::CursorRecord;
use crate::source::PageSource;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Value>,
    requests: Vec<PageRequest>,
}

/// Page source over an in-memory table of JSON objects.
///
/// Rows are ordered by `order_field` ascending. An anchored request starts
/// at the first row whose order field is greater than or equal to the
/// anchor, then applies `skip`. Filters are objects matched by field
/// equality. Clones share the same table, so rows may be inserted or
/// removed while a stream is reading it.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    order_field: String,
    table: Arc<Mutex<Table>>,
}

impl MemoryTable {
    /// Creates a table ordered by `order_field`.
    pub fn new<I>(order_field: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let table = Table {
            rows: rows.into_iter().collect(),
            requests: Vec::new(),
        };
        Self {
            order_field: order_field.into(),
            table: Arc::new(Mutex::new(table)),
        }
    }

    /// Creates a table of `count` rows `{"id": 1..=count}`.
    pub fn sequential(count: u64) -> Self {
        Self::new("id", (1..=count).map(|id| serde_json::json!({ "id": id })))
    }

    /// Inserts a row.
    pub fn insert(&self, row: Value) {
        self.lock().rows.push(row);
    }

    /// Removes every row whose order field equals `value`.
    pub fn remove(&self, value: &Value) {
        let field = self.order_field.clone();
        self.lock()
            .rows
            .retain(|row| row.cursor_value(&field).as_ref() != Some(value));
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of requests received so far.
    pub fn calls(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn order_key(&self, row: &Value) -> Value {
        row.cursor_value(&self.order_field).unwrap_or(Value::Null)
    }
}

#[async_trait::async_trait]
impl PageSource<Value> for MemoryTable {
    async fn find_many(&self, request: PageRequest) -> Result<Vec<Value>, BoxedError> {
        let mut table = self.lock();
        table.requests.push(request.clone());

        if let Some(anchor) = &request.cursor
            && anchor.field != self.order_field
        {
            return Err(format!(
                "table is ordered by \"{}\", not \"{}\"",
                self.order_field, anchor.field
            )
            .into());
        }

        let mut rows: Vec<&Value> = table
            .rows
            .iter()
            .filter(|row| matches_filter(row, request.filter.as_ref()))
            .collect();
        rows.sort_by(|a, b| compare(&self.order_key(a), &self.order_key(b)));

        let start = match request.cursor_value() {
            Some(anchor) => rows
                .iter()
                .position(|row| compare(&self.order_key(row), anchor) != Ordering::Less)
                .unwrap_or(rows.len()),
            None => 0,
        };

        let page = rows
            .into_iter()
            .skip(start + request.skip)
            .take(request.take)
            .map(|row| project(row, &request))
            .collect();

        Ok(page)
    }
}

fn matches_filter(row: &Value, filter: Option<&Value>) -> bool {
    match filter {
        Some(Value::Object(conditions)) => conditions
            .iter()
            .all(|(field, expected)| row.get(field) == Some(expected)),
        _ => true,
    }
}

fn project(row: &Value, request: &PageRequest) -> Value {
    let (Some(select), Value::Object(columns)) = (&request.select, row) else {
        return row.clone();
    };

    let projected: Map<String, Value> = columns
        .iter()
        .filter(|(field, _)| select.includes(field))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();
    Value::Object(projected)
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    // Mixed sign beyond i64, or floats.
    if a.is_u64() && b.is_i64() {
        return Ordering::Greater;
    }
    if a.is_i64() && b.is_u64() {
        return Ordering::Less;
    }

    let a = a.as_f64().unwrap_or(f64::NAN);
    let b = b.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::{CursorAnchor, FindManyArgs, Selection};

    fn request(take: usize, cursor: Option<u64>) -> PageRequest {
        let anchor = cursor.map(|id| CursorAnchor::new("id", id));
        PageRequest::next(&FindManyArgs::new(), take, anchor)
    }

    #[tokio::test]
    async fn anchored_request_is_inclusive_before_skip() {
        let table = MemoryTable::sequential(5);

        let page = table.find_many(request(2, None)).await.unwrap();
        assert_eq!(page, vec![json!({"id": 1}), json!({"id": 2})]);

        let page = table.find_many(request(2, Some(2))).await.unwrap();
        assert_eq!(page, vec![json!({"id": 3}), json!({"id": 4})]);
    }

    #[tokio::test]
    async fn filters_and_projects() {
        let table = MemoryTable::new(
            "id",
            [
                json!({"id": 2, "team": "a", "name": "x"}),
                json!({"id": 1, "team": "b", "name": "y"}),
                json!({"id": 3, "team": "a", "name": "z"}),
            ],
        );
        let args = FindManyArgs::new()
            .with_filter(json!({"team": "a"}))
            .with_select(Selection::fields(["id", "name"]));

        let page = table
            .find_many(PageRequest::next(&args, 10, None))
            .await
            .unwrap();
        assert_eq!(
            page,
            vec![json!({"id": 2, "name": "x"}), json!({"id": 3, "name": "z"})]
        );
    }

    #[tokio::test]
    async fn orders_large_integers_exactly() {
        let base = 1_u64 << 60;
        let table = MemoryTable::new(
            "id",
            [
                json!({"id": base + 2}),
                json!({"id": base + 1}),
                json!({"id": base + 3}),
            ],
        );

        let page = table
            .find_many(PageRequest::next(&FindManyArgs::new(), 2, None))
            .await
            .unwrap();
        assert_eq!(page, vec![json!({"id": base + 1}), json!({"id": base + 2})]);

        let anchor = CursorAnchor::new("id", base + 2);
        let page = table
            .find_many(PageRequest::next(&FindManyArgs::new(), 2, Some(anchor)))
            .await
            .unwrap();
        assert_eq!(page, vec![json!({"id": base + 3})]);
    }

    #[test]
    fn compares_mixed_sign_integers() {
        let neg = Number::from(-1_i64);
        let huge = Number::from(u64::MAX);
        assert_eq!(compare_numbers(&neg, &huge), Ordering::Less);
        assert_eq!(compare_numbers(&huge, &neg), Ordering::Greater);
    }

    #[tokio::test]
    async fn rejects_foreign_cursor_field() {
        let table = MemoryTable::sequential(3);
        let anchor = CursorAnchor::new("created_at", "2024-01-01");
        let result = table
            .find_many(PageRequest::next(&FindManyArgs::new(), 2, Some(anchor)))
            .await;
        assert!(result.is_err());
    }
}
