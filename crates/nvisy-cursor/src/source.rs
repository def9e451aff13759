//! Page source trait implemented by data-access backends.

use std::future::Future;
use std::sync::Arc;

use crate::error::{BoxedError, Result};
use crate::query::{FindManyArgs, PageRequest};
use crate::record::CursorRecord;
use crate::stream::CursorStream;

/// A data-access backend able to return one ordered page of records.
///
/// Implementations execute the request against their store and return at
/// most `request.take` records, ordered consistently with the cursor field.
/// When `request.cursor` is set the anchor record itself is included in the
/// result set before `request.skip` is applied.
#[async_trait::async_trait]
pub trait PageSource<R>: Send + Sync + 'static {
    /// Fetches a single page.
    async fn find_many(&self, request: PageRequest) -> Result<Vec<R>, BoxedError>;
}

#[async_trait::async_trait]
impl<R, S> PageSource<R> for Arc<S>
where
    R: Send + 'static,
    S: PageSource<R> + ?Sized,
{
    async fn find_many(&self, request: PageRequest) -> Result<Vec<R>, BoxedError> {
        (**self).find_many(request).await
    }
}

/// Extension trait for [`PageSource`] to open cursor streams.
pub trait PageSourceExt<R>: PageSource<R> + Sized
where
    R: CursorRecord + Send + 'static,
{
    /// Opens a stream over every record matching `args`.
    ///
    /// # Errors
    ///
    /// Fails before any page is fetched if `args` selects fields without the
    /// cursor field, or sets `take` to zero.
    fn cursor_stream(self, args: FindManyArgs) -> Result<CursorStream<R>> {
        CursorStream::builder(self, args).open()
    }

    /// Opens a stream that applies `transformer` to every page before
    /// emitting its output.
    ///
    /// The cursor of the next page is always read from the raw page, so the
    /// transformer may drop or reshape the cursor field freely.
    fn cursor_stream_with<T, F, Fut, E>(
        self,
        args: FindManyArgs,
        transformer: F,
    ) -> Result<CursorStream<T>>
    where
        T: Send + 'static,
        F: Fn(Vec<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
        E: Into<BoxedError> + 'static,
    {
        CursorStream::builder(self, args)
            .batch_transformer(transformer)
            .open()
    }
}

impl<R, S> PageSourceExt<R> for S
where
    R: CursorRecord + Send + 'static,
    S: PageSource<R>,
{
}
