//! Line splitting and field interpretation for the event-stream format.
//!
//! See the [event stream interpretation] rules of the HTML Living Standard.
//!
//! [event stream interpretation]: https://html.spec.whatwg.org/multipage/server-sent-events.html#event-stream-interpretation

use bytes::{Buf, Bytes, BytesMut};
use bytes_utils::Str;

use super::constants::{COLON, CR, EMPTY_STR, LF};

/// One classified line of an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// An empty line: the dispatch boundary.
    Empty,
    /// A comment (`:` in the first position).
    Comment,
    /// An `event` field with its value.
    Event(Str),
    /// A `data` field with its value.
    Data(Str),
    /// Any other field name. Accepted and ignored.
    Ignored,
}

/// Finds the next end-of-line in `bytes`.
///
/// Returns `(line_end, remainder_start)`: the non-inclusive end of the line
/// and the inclusive start of the remainder. Returns `None` if no terminator
/// has arrived yet. A CR ends its line at once, even as the last buffered
/// byte; the LF of a CRLF pair split across chunks is dropped by the caller.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let first_match = memchr::memchr2(CR, LF, bytes)?;

    match bytes[first_match] {
        LF => Some((first_match, first_match + 1)),
        _ if bytes.get(first_match + 1) == Some(&LF) => Some((first_match, first_match + 2)),
        _ => Some((first_match, first_match + 1)),
    }
}

/// Splits the next complete line off the front of `buffer`, without its
/// terminator.
///
/// The flag is `true` when the line ended in a CR that was the last buffered
/// byte, so a LF opening the next chunk still belongs to this terminator.
/// Returns `None` if the buffer holds no complete line yet.
pub(crate) fn next_line(buffer: &mut BytesMut) -> Option<(Bytes, bool)> {
    let (line_end, rem_start) = find_eol(buffer)?;
    let awaiting_lf = buffer[line_end] == CR && rem_start == buffer.len();

    let line = buffer.split_to(line_end).freeze();
    buffer.advance(rem_start - line_end);
    Some((line, awaiting_lf))
}

/// Decodes a field value. Invalid UTF-8 is replaced rather than rejected.
fn to_str(value: Bytes) -> Str {
    if value.is_empty() {
        return EMPTY_STR;
    }
    match std::str::from_utf8(&value) {
        // Safety: the bytes were just validated as UTF-8.
        Ok(_) => unsafe { Str::from_inner_unchecked(value) },
        Err(_) => Str::from(String::from_utf8_lossy(&value).as_ref()),
    }
}

/// Classifies a line (terminator already stripped).
///
/// The value is everything after the first colon, minus at most one leading
/// space. A line without a colon is a field name with an empty value, so a
/// bare `data` line appends an empty data fragment.
pub fn classify(line: Bytes) -> Line {
    if line.is_empty() {
        return Line::Empty;
    }

    let (name, value) = match memchr::memchr(COLON, &line) {
        Some(0) => return Line::Comment,
        Some(colon_pos) => {
            let value = line.slice(colon_pos + 1..);
            let value = if value.first() == Some(&b' ') {
                value.slice(1..)
            } else {
                value
            };
            (line.slice(..colon_pos), value)
        }
        None => (line, Bytes::new()),
    };

    match name.as_ref() {
        b"event" => Line::Event(to_str(value)),
        b"data" => Line::Data(to_str(value)),
        _ => Line::Ignored,
    }
}
