//! Batch transformers applied to whole pages before emission.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::{BoxedError, Error, Result};

type TransformFn<R, T> =
    dyn Fn(Vec<R>) -> BoxFuture<'static, Result<Vec<T>, BoxedError>> + Send + Sync;

/// Caller-supplied function mapping one full page of raw records to the
/// elements emitted for it.
///
/// The output may be shorter, longer or of a different type than the page.
pub struct BatchTransformer<R, T> {
    inner: Arc<TransformFn<R, T>>,
}

impl<R, T> BatchTransformer<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    /// Wraps an async function as a batch transformer.
    pub fn new<F, Fut, E>(f: F) -> Self
    where
        F: Fn(Vec<R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
        E: Into<BoxedError> + 'static,
    {
        let inner = move |batch: Vec<R>| -> BoxFuture<'static, Result<Vec<T>, BoxedError>> {
            f(batch).map(|r| r.map_err(Into::into)).boxed()
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Applies the transformer to a full page.
    pub async fn apply(&self, batch: Vec<R>) -> Result<Vec<T>> {
        (self.inner)(batch).await.map_err(Error::Transform)
    }
}

impl<R> BatchTransformer<R, R>
where
    R: Send + 'static,
{
    /// Returns a transformer emitting every page unchanged.
    pub fn identity() -> Self {
        Self::new(|batch: Vec<R>| async move { Ok::<_, BoxedError>(batch) })
    }
}

impl<R, T> Clone for BatchTransformer<R, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, T> std::fmt::Debug for BatchTransformer<R, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchTransformer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[tokio::test]
    async fn identity_passes_pages_through() {
        let transformer = BatchTransformer::identity();
        let out = transformer.apply(vec![1, 2, 3]).await.unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn may_change_length_and_type() {
        let transformer = BatchTransformer::new(|batch: Vec<u32>| async move {
            Ok::<_, BoxedError>(vec![batch.len()])
        });
        let out = transformer.apply(vec![4, 5, 6, 7, 8]).await.unwrap();
        assert_eq!(out, vec![5]);
    }

    #[tokio::test]
    async fn failures_become_transform_errors() {
        let transformer = BatchTransformer::new(|_batch: Vec<u32>| async move {
            Err::<Vec<u32>, _>(std::io::Error::other("bad row"))
        });
        let err = transformer.apply(vec![1]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transform);
        assert!(err.to_string().contains("bad row"));
    }
}
