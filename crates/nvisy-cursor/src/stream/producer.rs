//! Producer task feeding the bounded buffer of a cursor stream.

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::pager::CursorPager;
use crate::record::CursorRecord;
use crate::source::PageSource;
use crate::stream::StreamState;
use crate::TRACING_TARGET_STREAM;

/// Drives `pager` until exhaustion, error or cancellation.
///
/// A fetch only starts once a slot is free in `sender`, so the number of
/// records buffered ahead of the consumer never exceeds its capacity.
pub(crate) async fn produce<S, R, T>(
    mut pager: CursorPager<S, R, T>,
    sender: mpsc::Sender<Result<T>>,
    state: watch::Sender<StreamState>,
    cancel_token: CancellationToken,
) where
    S: PageSource<R>,
    R: CursorRecord + Send + 'static,
    T: Send + 'static,
{
    let final_state = loop {
        let permit = tokio::select! {
            biased;

            () = cancel_token.cancelled() => break StreamState::Cancelled,

            permit = sender.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => break StreamState::Cancelled,
            },
        };

        state.send_replace(StreamState::Fetching);

        let result = tokio::select! {
            biased;

            () = cancel_token.cancelled() => break StreamState::Cancelled,

            result = pager.next_batch() => result,
        };

        let batch = match result {
            Ok(Some(batch)) => batch,
            Ok(None) => break StreamState::Completed,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET_STREAM,
                    error = %err,
                    kind = err.kind_str(),
                    pages_fetched = pager.pages_fetched(),
                    "Cursor stream failed"
                );
                permit.send(Err(err));
                break StreamState::Errored;
            }
        };

        let mut items = batch.items.into_iter();
        if let Some(first) = items.next() {
            permit.send(Ok(first));
        }

        let mut delivered = true;
        for item in items {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    delivered = false;
                    break;
                }

                result = sender.send(Ok(item)) => {
                    if result.is_err() {
                        delivered = false;
                        break;
                    }
                }
            }
        }

        if !delivered {
            break StreamState::Cancelled;
        }

        if batch.is_last {
            break StreamState::Completed;
        }

        state.send_replace(StreamState::Idle);
    };

    tracing::debug!(
        target: TRACING_TARGET_STREAM,
        state = %final_state,
        pages_fetched = pager.pages_fetched(),
        "Cursor stream finished"
    );

    state.send_replace(final_state);
}
