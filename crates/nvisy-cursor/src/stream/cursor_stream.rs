//! Pull-based stream over cursor-paginated pages.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::CursorStreamBuilder;
use super::StreamState;
use crate::TRACING_TARGET_STREAM;
use crate::error::Result;
use crate::query::FindManyArgs;
use crate::record::CursorRecord;
use crate::source::PageSource;

/// Stream of records read page by page from a [`PageSource`].
///
/// Pages are fetched by a background task that starts on the first poll and
/// only fetches while the internal buffer has room, so at most
/// [`capacity`](Self::capacity) records are held ahead of the consumer.
///
/// A failed fetch or transform is yielded once as `Some(Err(_))`, after which
/// the stream ends. Dropping the stream cancels the background task.
///
/// ## Example
///
/// ```rust,ignore
/// use futures::TryStreamExt;
/// use nvisy_cursor::{FindManyArgs, PageSourceExt};
///
/// let args = FindManyArgs::new().with_take(500);
/// let mut stream = source.cursor_stream(args)?;
/// while let Some(record) = stream.try_next().await? {
///     export(record).await?;
/// }
/// ```
pub struct CursorStream<T> {
    receiver: mpsc::Receiver<Result<T>>,
    producer: Option<BoxFuture<'static, ()>>,
    handle: Option<JoinHandle<()>>,
    state: watch::Receiver<StreamState>,
    cancel_token: CancellationToken,
    capacity: usize,
    cursor_field: String,
}

impl<R> CursorStream<R>
where
    R: CursorRecord + Send + 'static,
{
    /// Returns a builder for a stream of records from `source`.
    pub fn builder<S>(source: S, args: FindManyArgs) -> CursorStreamBuilder<S, R, R>
    where
        S: PageSource<R>,
    {
        CursorStreamBuilder::new(source, args)
    }
}

impl<T> CursorStream<T> {
    pub(crate) fn new(
        receiver: mpsc::Receiver<Result<T>>,
        producer: BoxFuture<'static, ()>,
        state: watch::Receiver<StreamState>,
        cancel_token: CancellationToken,
        capacity: usize,
        cursor_field: String,
    ) -> Self {
        Self {
            receiver,
            producer: Some(producer),
            handle: None,
            state,
            cancel_token,
            capacity,
            cursor_field,
        }
    }

    /// Returns the current lifecycle state of the producer.
    #[inline]
    pub fn state(&self) -> StreamState {
        let state = *self.state.borrow();
        if !state.is_terminal() && self.cancel_token.is_cancelled() {
            return StreamState::Cancelled;
        }
        state
    }

    /// Returns the maximum number of records buffered ahead of the consumer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of records fetched but not yet consumed.
    #[inline]
    pub fn buffered_len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the field ordering and anchoring this stream.
    #[inline]
    pub fn cursor_field(&self) -> &str {
        &self.cursor_field
    }

    /// Returns true once the stream was cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Stops the stream.
    ///
    /// No fetch starts after this call; a fetch already in flight is
    /// abandoned. Buffered records are discarded and the stream ends.
    pub fn cancel(&mut self) {
        if self.cancel_token.is_cancelled() {
            return;
        }

        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            cursor_field = %self.cursor_field,
            state = %self.state(),
            "Cancelling cursor stream"
        );

        self.cancel_token.cancel();
        self.receiver.close();
        self.producer = None;
    }

    fn start(&mut self) {
        if let Some(producer) = self.producer.take() {
            tracing::trace!(
                target: TRACING_TARGET_STREAM,
                cursor_field = %self.cursor_field,
                capacity = self.capacity,
                "Starting cursor stream producer"
            );
            self.handle = Some(tokio::spawn(producer));
        }
    }
}

impl<T> Stream for CursorStream<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancel_token.is_cancelled() {
            return Poll::Ready(None);
        }

        this.start();
        this.receiver.poll_recv(cx)
    }
}

impl<T> Drop for CursorStream<T> {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl<T> std::fmt::Debug for CursorStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorStream")
            .field("cursor_field", &self.cursor_field)
            .field("capacity", &self.capacity)
            .field("buffered_len", &self.buffered_len())
            .field("state", &self.state())
            .field("started", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}
