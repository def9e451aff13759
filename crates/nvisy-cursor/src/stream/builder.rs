//! Builder for cursor streams.

use std::future::Future;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::producer::produce;
use super::{CursorStream, StreamState};
use crate::config::CursorConfig;
use crate::error::{BoxedError, Result};
use crate::pager::{CursorPager, PagePlan};
use crate::query::FindManyArgs;
use crate::record::CursorRecord;
use crate::source::PageSource;
use crate::transform::BatchTransformer;
use crate::TRACING_TARGET_STREAM;

/// Builder for a [`CursorStream`].
///
/// `T` is the element type of the resulting stream: the record type itself
/// until a batch transformer is set.
#[must_use = "builders do nothing until opened"]
pub struct CursorStreamBuilder<S, R, T> {
    source: S,
    args: FindManyArgs,
    config: CursorConfig,
    transformer: BatchTransformer<R, T>,
}

impl<S, R> CursorStreamBuilder<S, R, R>
where
    S: PageSource<R>,
    R: CursorRecord + Send + 'static,
{
    /// Creates a builder emitting raw records.
    pub fn new(source: S, args: FindManyArgs) -> Self {
        Self {
            source,
            args,
            config: CursorConfig::default(),
            transformer: BatchTransformer::identity(),
        }
    }
}

impl<S, R, T> CursorStreamBuilder<S, R, T>
where
    S: PageSource<R>,
    R: CursorRecord + Send + 'static,
    T: Send + 'static,
{
    /// Sets the configuration.
    pub fn config(mut self, config: CursorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the buffer capacity, overriding the configured one.
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = Some(capacity);
        self
    }

    /// Sets an async function applied to every full page before emission.
    pub fn batch_transformer<U, F, Fut, E>(self, f: F) -> CursorStreamBuilder<S, R, U>
    where
        U: Send + 'static,
        F: Fn(Vec<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<U>, E>> + Send + 'static,
        E: Into<BoxedError> + 'static,
    {
        self.transformer(BatchTransformer::new(f))
    }

    /// Sets a prebuilt batch transformer.
    pub fn transformer<U>(self, transformer: BatchTransformer<R, U>) -> CursorStreamBuilder<S, R, U>
    where
        U: Send + 'static,
    {
        CursorStreamBuilder {
            source: self.source,
            args: self.args,
            config: self.config,
            transformer,
        }
    }

    /// Validates the arguments and returns the stream.
    ///
    /// No page is fetched here; the first fetch happens on the first poll.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `take` is zero, the configuration is
    /// invalid, or the field selection omits the cursor field.
    pub fn open(self) -> Result<CursorStream<T>> {
        let plan = PagePlan::derive(&self.args, &self.config).inspect_err(|err| {
            tracing::warn!(
                target: TRACING_TARGET_STREAM,
                error = %err,
                "Rejected cursor stream configuration"
            );
        })?;

        tracing::debug!(
            target: TRACING_TARGET_STREAM,
            cursor_field = %plan.cursor_field,
            take = plan.take,
            buffer_capacity = plan.buffer_capacity,
            "Opened cursor stream"
        );

        let capacity = plan.buffer_capacity;
        let cursor_field = plan.cursor_field.clone();
        let span = tracing::debug_span!(
            target: TRACING_TARGET_STREAM,
            "cursor_stream",
            cursor_field = %cursor_field,
            take = plan.take,
        );

        let pager = CursorPager::new(self.source, self.args, plan, self.transformer);
        let (sender, receiver) = mpsc::channel(capacity);
        let (state_tx, state_rx) = watch::channel(StreamState::Idle);
        let cancel_token = CancellationToken::new();

        let producer = produce(pager, sender, state_tx, cancel_token.clone())
            .instrument(span)
            .boxed();

        Ok(CursorStream::new(
            receiver,
            producer,
            state_rx,
            cancel_token,
            capacity,
            cursor_field,
        ))
    }
}

impl<S, R, T> std::fmt::Debug for CursorStreamBuilder<S, R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorStreamBuilder")
            .field("args", &self.args)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
