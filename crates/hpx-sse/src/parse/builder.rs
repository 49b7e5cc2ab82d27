//! Accumulates the fields of one in-progress event.

use bytes::BytesMut;
use bytes_utils::{Str, StrMut};

use super::constants::{EMPTY_STR, MESSAGE_STR};
use crate::event::ServerSentEvent;

/// Data fragments of the pending event.
///
/// The common case is a single `data` line per event, so the first fragment is
/// kept as an immutable [`Str`] and the buffer is only upgraded to a mutable
/// one when a second fragment arrives.
#[derive(Debug, Default, Clone)]
enum DataBuffer {
    #[default]
    Uninit,
    Immutable(Str),
    Mutable(StrMut),
}

impl DataBuffer {
    fn freeze(self) -> Str {
        match self {
            Self::Uninit => EMPTY_STR,
            Self::Immutable(s) => s,
            Self::Mutable(s) => s.freeze(),
        }
    }

    fn push_str(&mut self, s: Str) {
        match self {
            Self::Uninit => *self = Self::Immutable(s),
            Self::Immutable(first) => {
                let inner = BytesMut::with_capacity(first.len() + 1 + s.len());
                // Safety: the buffer is empty, there are no bytes to be invalid.
                let mut buf = unsafe { StrMut::from_inner_unchecked(inner) };
                buf.push_str(first);
                buf.push('\n');
                buf.push_str(&s);
                *self = Self::Mutable(buf);
            }
            Self::Mutable(buf) => {
                buf.push('\n');
                buf.push_str(&s);
            }
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Self::Uninit)
    }
}

/// Builder for a single [`ServerSentEvent`].
///
/// Owned by one decoder. After every flush attempt, successful or not, the
/// caller resets it so that an `event` field from an event without data never
/// leaks into the next one.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event_type: Str,
    data: DataBuffer,
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self {
            event_type: EMPTY_STR,
            data: DataBuffer::Uninit,
        }
    }
}

impl EventBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the pending event type. The last write before a flush wins.
    pub fn set_event_type(&mut self, value: impl Into<Str>) {
        self.event_type = value.into();
    }

    /// Append one data fragment.
    pub fn append_data(&mut self, value: impl Into<Str>) {
        self.data.push_str(value.into());
    }

    /// Returns `true` if no data fragment has been appended since the last
    /// reset.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Build the pending event.
    ///
    /// Returns `None` when no data fragment was appended, regardless of the
    /// event type. The builder must be [`reset`](Self::reset) afterwards.
    #[must_use]
    pub fn try_flush(&mut self) -> Option<ServerSentEvent> {
        if self.data.is_empty() {
            return None;
        }

        let event_type = if self.event_type.is_empty() {
            MESSAGE_STR
        } else {
            self.event_type.clone()
        };

        Some(ServerSentEvent {
            event_type,
            data: core::mem::take(&mut self.data).freeze(),
        })
    }

    /// Clear the pending event type and all data fragments.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
