//! The connection factory seam between the event source and its transport.

use std::{future::Future, pin::Pin};

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::SseResult;

/// Body of one SSE response, as a stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = SseResult<Bytes>> + Send>>;

/// How much of the response must have arrived before `connect` returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompletionMode {
    /// Return as soon as the headers are in and stream the body.
    #[default]
    HeadersRead,
    /// Buffer the whole body before returning.
    ContentRead,
}

/// Opens one SSE response per call.
///
/// An [`EventSource`](crate::EventSource) calls this afresh for every
/// (re)connect and drops the returned stream when that cycle ends. The
/// supervisor always asks for [`CompletionMode::HeadersRead`].
///
/// Implementations should give up with [`SseError::Cancelled`] once `cancel`
/// fires; any other error is reported to the subscriber and retried.
///
/// Plain async closures implement this trait:
///
/// ```rust
/// use futures_util::stream;
/// use hpx_sse::{ByteStream, CompletionMode, SseResult, source::Connect};
/// use tokio_util::sync::CancellationToken;
///
/// fn assert_connect<C: Connect>(_: C) {}
///
/// assert_connect(|_mode: CompletionMode, _cancel: CancellationToken| async {
///     let body: ByteStream = Box::pin(stream::empty());
///     SseResult::Ok(body)
/// });
/// ```
///
/// [`SseError::Cancelled`]: crate::SseError::Cancelled
#[async_trait]
pub trait Connect: Send + Sync + 'static {
    /// Open a new response body.
    async fn connect(&self, mode: CompletionMode, cancel: CancellationToken)
    -> SseResult<ByteStream>;
}

#[async_trait]
impl<F, Fut> Connect for F
where
    F: Fn(CompletionMode, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = SseResult<ByteStream>> + Send + 'static,
{
    async fn connect(
        &self,
        mode: CompletionMode,
        cancel: CancellationToken,
    ) -> SseResult<ByteStream> {
        (self)(mode, cancel).await
    }
}
