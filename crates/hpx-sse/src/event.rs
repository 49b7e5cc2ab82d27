//! The event value shared by the decoder, the event source and the writer.

use std::fmt;

use bytes_utils::Str;

use crate::parse::constants::MESSAGE_STR;

/// A single Server-Sent Event.
///
/// Produced once per dispatch boundary by the decoder and never mutated
/// afterwards. `data` holds every `data` line of the event joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerSentEvent {
    /// The event type (`"message"` when the stream did not name one).
    pub event_type: Str,
    /// The data payload.
    pub data: Str,
}

impl ServerSentEvent {
    /// Create an event with the given type and payload.
    ///
    /// An empty `event_type` is replaced by `"message"`.
    pub fn new(event_type: impl Into<Str>, data: impl Into<Str>) -> Self {
        let event_type = event_type.into();
        Self {
            event_type: if event_type.is_empty() {
                MESSAGE_STR
            } else {
                event_type
            },
            data: data.into(),
        }
    }

    /// Create a `"message"` event carrying `data`.
    pub fn message(data: impl Into<Str>) -> Self {
        Self {
            event_type: MESSAGE_STR,
            data: data.into(),
        }
    }

    /// Convenience accessor for the event type.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Convenience accessor for the data payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Iterate over the individual lines of the payload.
    ///
    /// `\r\n`, `\r` and `\n` all end a line. An empty payload is one empty
    /// line.
    pub fn data_lines(&self) -> impl Iterator<Item = &str> {
        let mut rest = Some(&*self.data);
        std::iter::from_fn(move || {
            let s = rest?;
            match s.find(['\r', '\n']) {
                Some(i) => {
                    let eol = if s[i..].starts_with("\r\n") { 2 } else { 1 };
                    rest = Some(&s[i + eol..]);
                    Some(&s[..i])
                }
                None => {
                    rest = None;
                    Some(s)
                }
            }
        })
    }
}

impl fmt::Display for ServerSentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.event_type, self.data)
    }
}
