//! Cursor pager producing successive pages from a page source.
//!
//! The pager owns the resume position of a stream. Each call to
//! [`CursorPager::next_batch`] performs one fetch-and-transform cycle:
//!
//! 1. request `take` records anchored on the last seen cursor value,
//! 2. apply the batch transformer to the whole page,
//! 3. either mark the pager exhausted (short page) or advance the cursor to
//!    the last **raw** record of the page.

use std::marker::PhantomData;

use serde_json::Value;

use crate::config::{CursorConfig, MAX_BUFFER_CAPACITY};
use crate::error::{Error, Result};
use crate::query::{CursorAnchor, FindManyArgs, PageRequest};
use crate::record::CursorRecord;
use crate::source::PageSource;
use crate::transform::BatchTransformer;
use crate::TRACING_TARGET_PAGER;

/// Pagination settings derived once from a query specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    /// Records requested per page.
    pub take: usize,
    /// Field ordering and anchoring the pagination.
    pub cursor_field: String,
    /// Records buffered ahead of the consumer.
    pub buffer_capacity: usize,
}

impl PagePlan {
    /// Derives the plan for `args`, validating it against `config`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `take` is zero or `config` is invalid.
    /// - [`Error::MissingCursorField`] if `args.select` omits the cursor field.
    pub fn derive(args: &FindManyArgs, config: &CursorConfig) -> Result<Self> {
        config.validate()?;

        let take = args.take.unwrap_or(config.default_take);
        if take == 0 {
            return Err(Error::invalid_config("take must be at least 1"));
        }

        let cursor_field = args
            .cursor_field()
            .unwrap_or(&config.identity_field)
            .to_string();

        if let Some(select) = &args.select
            && !select.includes(&cursor_field)
        {
            return Err(Error::missing_cursor_field(cursor_field));
        }

        let buffer_capacity = config.buffer_capacity_for(take);
        if buffer_capacity > MAX_BUFFER_CAPACITY {
            return Err(Error::invalid_config(format!(
                "buffer capacity {buffer_capacity} for take {take} exceeds {MAX_BUFFER_CAPACITY}"
            )));
        }

        Ok(Self {
            take,
            buffer_capacity,
            cursor_field,
        })
    }
}

/// Outcome of one fetch-and-transform cycle.
#[derive(Debug)]
pub struct Batch<T> {
    /// Elements to emit, in order.
    pub items: Vec<T>,
    /// Number of raw records in the fetched page.
    pub raw_len: usize,
    /// True if the page was short and no further page will be fetched.
    pub is_last: bool,
}

/// Fetches pages from a [`PageSource`], one at a time.
///
/// `next_batch` takes `&mut self`, so a pager never has two fetches in flight.
pub struct CursorPager<S, R, T> {
    source: S,
    args: FindManyArgs,
    plan: PagePlan,
    transformer: BatchTransformer<R, T>,
    cursor: Option<Value>,
    pages_fetched: u64,
    exhausted: bool,
    _record: PhantomData<fn() -> R>,
}

impl<S, R, T> CursorPager<S, R, T>
where
    S: PageSource<R>,
    R: CursorRecord + Send + 'static,
    T: Send + 'static,
{
    /// Creates a pager over `source` following `plan`.
    pub fn new(
        source: S,
        args: FindManyArgs,
        plan: PagePlan,
        transformer: BatchTransformer<R, T>,
    ) -> Self {
        Self {
            source,
            args,
            plan,
            transformer,
            cursor: None,
            pages_fetched: 0,
            exhausted: false,
            _record: PhantomData,
        }
    }

    /// Returns the pagination plan.
    #[inline]
    pub fn plan(&self) -> &PagePlan {
        &self.plan
    }

    /// Returns the current resume position, if a full page has been seen.
    #[inline]
    pub fn cursor(&self) -> Option<&Value> {
        self.cursor.as_ref()
    }

    /// Returns the number of pages fetched so far.
    #[inline]
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Returns true once a short page has been seen.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Builds the request for the next page.
    pub fn next_request(&self) -> PageRequest {
        let anchor = self
            .cursor
            .clone()
            .map(|value| CursorAnchor::new(self.plan.cursor_field.clone(), value));
        PageRequest::next(&self.args, self.plan.take, anchor)
    }

    /// Fetches, transforms and returns the next page.
    ///
    /// Returns `Ok(None)` once the pager is exhausted. Errors are terminal:
    /// the caller must not call `next_batch` again after one.
    pub async fn next_batch(&mut self) -> Result<Option<Batch<T>>> {
        if self.exhausted {
            return Ok(None);
        }

        let request = self.next_request();
        let page_number = self.pages_fetched + 1;

        tracing::trace!(
            target: TRACING_TARGET_PAGER,
            page = page_number,
            take = request.take,
            skip = request.skip,
            cursor = ?request.cursor_value(),
            "Fetching page"
        );

        let records = self
            .source
            .find_many(request)
            .await
            .map_err(Error::Fetch)?;
        self.pages_fetched = page_number;

        let raw_len = records.len();
        let is_last = raw_len < self.plan.take;

        // Read before the page is handed to the transformer.
        let next_cursor = if is_last {
            None
        } else {
            let last = records.last().and_then(|r| r.cursor_value(&self.plan.cursor_field));
            Some(last.ok_or_else(|| Error::missing_cursor_value(&self.plan.cursor_field))?)
        };

        let items = self.transformer.apply(records).await?;

        tracing::debug!(
            target: TRACING_TARGET_PAGER,
            page = page_number,
            raw_len,
            emitted = items.len(),
            is_last,
            cursor = ?next_cursor,
            "Fetched page"
        );

        if is_last {
            self.exhausted = true;
        } else {
            self.cursor = next_cursor;
        }

        Ok(Some(Batch {
            items,
            raw_len,
            is_last,
        }))
    }
}

impl<S, R, T> std::fmt::Debug for CursorPager<S, R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorPager")
            .field("plan", &self.plan)
            .field("cursor", &self.cursor)
            .field("pages_fetched", &self.pages_fetched)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mock::ScriptedSource;
    use crate::query::Selection;

    fn pager<T: Send + 'static>(
        source: &ScriptedSource,
        args: FindManyArgs,
        transformer: BatchTransformer<Value, T>,
    ) -> CursorPager<ScriptedSource, Value, T> {
        let plan = PagePlan::derive(&args, &CursorConfig::default()).unwrap();
        CursorPager::new(source.clone(), args, plan, transformer)
    }

    #[test]
    fn plan_defaults() {
        let plan = PagePlan::derive(&FindManyArgs::new(), &CursorConfig::default()).unwrap();
        assert_eq!(plan.take, 100);
        assert_eq!(plan.cursor_field, "id");
        assert_eq!(plan.buffer_capacity, 200);
    }

    #[test]
    fn plan_uses_cursor_seed_and_explicit_capacity() {
        let args = FindManyArgs::new()
            .with_take(10)
            .with_skip(3)
            .with_cursor_field("created_at");
        let config = CursorConfig::default().with_buffer_capacity(15);
        let plan = PagePlan::derive(&args, &config).unwrap();

        assert_eq!(plan.cursor_field, "created_at");
        assert_eq!(plan.buffer_capacity, 15);
    }

    #[test]
    fn plan_rejects_zero_take() {
        let args = FindManyArgs::new().with_take(0);
        let err = PagePlan::derive(&args, &CursorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn plan_rejects_oversized_buffer() {
        let args = FindManyArgs::new().with_take(usize::MAX / 2);
        let err = PagePlan::derive(&args, &CursorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let config = CursorConfig::default().with_buffer_capacity(usize::MAX / 2);
        let err = PagePlan::derive(&FindManyArgs::new(), &config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn plan_requires_cursor_in_selection() {
        let args = FindManyArgs::new().with_select(Selection::fields(["name"]));
        let err = PagePlan::derive(&args, &CursorConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "Must select cursor field \"id\"");

        let args = FindManyArgs::new().with_select(Selection::fields(["id", "name"]));
        assert!(PagePlan::derive(&args, &CursorConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn advances_cursor_from_last_raw_record() {
        let source = ScriptedSource::new([
            vec![json!({"id": 1}), json!({"id": 2})],
            vec![json!({"id": 3})],
        ]);
        let args = FindManyArgs::new().with_take(2);
        let mut pager = pager(&source, args, BatchTransformer::identity());

        let first = pager.next_batch().await.unwrap().unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(!first.is_last);
        assert_eq!(pager.cursor(), Some(&json!(2)));

        let second = pager.next_batch().await.unwrap().unwrap();
        assert_eq!(second.items, vec![json!({"id": 3})]);
        assert!(second.is_last);
        assert!(pager.is_exhausted());
        assert!(pager.next_batch().await.unwrap().is_none());

        let requests = source.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].skip, 0);
        assert!(requests[0].cursor.is_none());
        assert_eq!(requests[1].skip, 1);
        assert_eq!(requests[1].cursor, Some(CursorAnchor::new("id", 2)));
    }

    #[tokio::test]
    async fn query_skip_is_overridden() {
        let source = ScriptedSource::new([
            vec![json!({"id": 1}), json!({"id": 2})],
            vec![],
        ]);
        let args = FindManyArgs::new().with_take(2).with_skip(50);
        let mut pager = pager(&source, args, BatchTransformer::identity());

        while pager.next_batch().await.unwrap().is_some() {}

        let requests = source.requests();
        assert_eq!(requests[0].skip, 0);
        assert!(requests[0].cursor.is_none());
        assert_eq!(requests[1].skip, 1);
    }

    #[tokio::test]
    async fn cursor_ignores_transformed_output() {
        let page: Vec<Value> = (1..=5).map(|id| json!({"id": id})).collect();
        let source = ScriptedSource::new([page, vec![]]);
        let args = FindManyArgs::new().with_take(5);
        let counter = BatchTransformer::new(|batch: Vec<Value>| async move {
            Ok::<_, crate::BoxedError>(vec![batch.len()])
        });
        let mut pager = pager(&source, args, counter);

        let batch = pager.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.items, vec![5]);
        assert_eq!(batch.raw_len, 5);
        assert_eq!(pager.cursor(), Some(&json!(5)));
    }

    #[tokio::test]
    async fn missing_cursor_value_is_an_error() {
        let source = ScriptedSource::new([vec![json!({"id": 1}), json!({"name": "x"})]]);
        let args = FindManyArgs::new().with_take(2);
        let mut pager = pager(&source, args, BatchTransformer::identity());

        let err = pager.next_batch().await.unwrap_err();
        assert!(matches!(err, Error::MissingCursorValue { ref field } if field == "id"));
    }

    #[tokio::test]
    async fn fetch_failure_is_propagated() {
        let source = ScriptedSource::new([vec![json!({"id": 1})]]).fail_on_call(1);
        let mut pager = pager(&source, FindManyArgs::new(), BatchTransformer::identity());

        let err = pager.next_batch().await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Fetch);
        assert_eq!(pager.pages_fetched(), 0);
    }
}
