//! Response body shared between an [`EventSource`](super::EventSource) and
//! its background task, so dropping the source can release the connection
//! without waiting for the task to run.

use std::{
    fmt,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard},
    task::{Context, Poll},
};

use bytes::Bytes;
use futures_core::Stream;

use super::connect::ByteStream;
use crate::error::SseResult;

/// Holds the body of the current response, if any.
#[derive(Clone, Default)]
pub(super) struct SharedBody(Arc<Mutex<Option<ByteStream>>>);

impl SharedBody {
    fn lock(&self) -> MutexGuard<'_, Option<ByteStream>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `body` in the slot, returning a stream that reads through it.
    pub(super) fn install(&self, body: ByteStream) -> BodyReader {
        *self.lock() = Some(body);
        BodyReader { slot: self.clone() }
    }

    /// Drop the stored body. Returns `true` if there was one.
    pub(super) fn release(&self) -> bool {
        // Take first so the body is dropped outside the lock.
        let body = self.lock().take();
        body.is_some()
    }

    /// Returns `true` if a body is stored.
    pub(super) fn is_held(&self) -> bool {
        self.lock().is_some()
    }
}

impl fmt::Debug for SharedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBody")
            .field("held", &self.is_held())
            .finish()
    }
}

/// Reads the body stored in a [`SharedBody`]. Ends once it is released.
pub(super) struct BodyReader {
    slot: SharedBody,
}

impl Stream for BodyReader {
    type Item = SseResult<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.slot.lock().as_mut() {
            Some(body) => body.as_mut().poll_next(cx),
            None => Poll::Ready(None),
        }
    }
}
