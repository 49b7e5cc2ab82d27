//! [`Stream`] that converts a stream of byte chunks into
//! [`ServerSentEvent`]s.

use core::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures_core::Stream;

use super::decoder::EventDecoder;
use crate::event::ServerSentEvent;

pin_project_lite::pin_project! {
    /// A [`Stream`] that decodes a stream of byte chunks into
    /// [`ServerSentEvent`]s.
    ///
    /// Transport errors from the inner stream are passed through as they
    /// arrive. When the inner stream ends, the remaining complete lines are
    /// decoded and the stream ends too; an event without its closing blank
    /// line is dropped.
    #[project = EventStreamProjection]
    #[derive(Debug)]
    pub struct EventStream<S> {
        #[pin]
        stream: S,
        decoder: EventDecoder,
    }
}

impl<S> EventStream<S> {
    /// Create a new [`EventStream`] from an underlying byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: EventDecoder::new(),
        }
    }

    /// Consume the adapter, returning the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S, E, B> Stream for EventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    type Item = Result<ServerSentEvent, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(event) = this.decoder.next_event() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.decoder.is_finished() {
                return Poll::Ready(None);
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.decoder.extend(chunk.as_ref()),
                Some(Err(e)) => return Poll::Ready(Some(Err(e))),
                None => this.decoder.finish(),
            }
        }
    }
}
