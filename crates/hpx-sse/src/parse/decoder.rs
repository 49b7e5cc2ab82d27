//! Incremental decoder turning byte chunks into [`ServerSentEvent`]s.

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use super::{
    builder::EventBuilder,
    constants::{BOM, LF},
    line::{Line, classify, next_line},
};
use crate::event::ServerSentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Waiting for enough bytes to rule out a leading BOM.
    NotStarted,
    Started,
    /// Input ended. Further chunks are ignored.
    Finished,
}

/// Streaming event-stream decoder.
///
/// Bytes may be split at arbitrary positions: a line, a CRLF pair, the BOM or
/// a UTF-8 sequence can all straddle two chunks. Only a blank line dispatches
/// an event; whatever is pending when the input ends is discarded.
#[derive(Debug)]
pub struct EventDecoder {
    buffer: BytesMut,
    builder: EventBuilder,
    state: DecoderState,
    /// The last line ended in a CR at the end of the buffer: a LF opening the
    /// next chunk completes that CRLF and is dropped.
    skip_lf: bool,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `Some(true)` for a BOM, `Some(false)` for anything else, and
/// `None` while the buffer is a strict prefix of the BOM.
const fn starts_with_bom(buf: &[u8]) -> Option<bool> {
    match buf.len() {
        0 => None,
        1 => {
            if buf[0] == BOM[0] {
                None
            } else {
                Some(false)
            }
        }
        2 => {
            if buf[0] == BOM[0] && buf[1] == BOM[1] {
                None
            } else {
                Some(false)
            }
        }
        _gte_3 => Some(buf[0] == BOM[0] && buf[1] == BOM[1] && buf[2] == BOM[2]),
    }
}

impl EventDecoder {
    /// Create a decoder with an empty buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            builder: EventBuilder::new(),
            state: DecoderState::NotStarted,
            skip_lf: false,
        }
    }

    /// Append a chunk of input.
    pub fn extend(&mut self, chunk: &[u8]) {
        if chunk.is_empty() || self.state == DecoderState::Finished {
            return;
        }
        let chunk = match chunk.split_first() {
            Some((&LF, rest)) if core::mem::take(&mut self.skip_lf) => rest,
            _ => {
                self.skip_lf = false;
                chunk
            }
        };
        self.buffer.extend_from_slice(chunk);

        if self.state == DecoderState::NotStarted {
            match starts_with_bom(&self.buffer) {
                Some(true) => {
                    self.buffer.advance(BOM.len());
                    self.state = DecoderState::Started;
                }
                Some(false) => self.state = DecoderState::Started,
                None => {}
            }
        }
    }

    /// Decode the next complete event from the buffered input, if any.
    pub fn next_event(&mut self) -> Option<ServerSentEvent> {
        if self.state == DecoderState::NotStarted {
            return None;
        }
        while let Some((line, awaiting_lf)) = next_line(&mut self.buffer) {
            self.skip_lf = awaiting_lf;
            if let Some(event) = self.process(classify(line)) {
                return Some(event);
            }
        }
        None
    }

    /// Mark the end of input.
    ///
    /// Keep calling [`next_event`](Self::next_event) to drain the complete
    /// lines that remain; the unterminated tail and any partially built event
    /// are never dispatched. Further input is ignored.
    pub fn finish(&mut self) {
        self.state = DecoderState::Finished;
    }

    /// Returns `true` once [`finish`](Self::finish) has been called.
    pub fn is_finished(&self) -> bool {
        self.state == DecoderState::Finished
    }

    /// Decode every event contained in `chunk` together with previously
    /// buffered input.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerSentEvent> {
        self.extend(chunk);
        std::iter::from_fn(|| self.next_event()).collect()
    }

    /// Interpret one already-split line, as if it had been read from the
    /// stream. Returns the event dispatched by a blank line.
    pub fn decode_line(&mut self, line: &str) -> Option<ServerSentEvent> {
        self.process(classify(Bytes::copy_from_slice(line.as_bytes())))
    }

    /// Discard buffered input and the pending event, ready for a new stream.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.builder.reset();
        self.state = DecoderState::NotStarted;
        self.skip_lf = false;
    }

    fn process(&mut self, line: Line) -> Option<ServerSentEvent> {
        match line {
            Line::Empty => {
                let event = self.builder.try_flush();
                self.builder.reset();
                if let Some(event) = &event {
                    trace!(
                        event_type = %event.event_type,
                        len = event.data.len(),
                        "SSE event decoded"
                    );
                }
                event
            }
            Line::Event(value) => {
                self.builder.set_event_type(value);
                None
            }
            Line::Data(value) => {
                self.builder.append_data(value);
                None
            }
            Line::Comment | Line::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(input: &[u8]) -> Vec<ServerSentEvent> {
        let mut decoder = EventDecoder::new();
        let mut events = decoder.feed(input);
        decoder.finish();
        events.extend(std::iter::from_fn(|| decoder.next_event()));
        events
    }

    #[test]
    fn test_multiline_data() {
        assert_eq!(
            decode_all(b"data: YHOO\ndata: +2\ndata: 10\n\n"),
            vec![ServerSentEvent::new("message", "YHOO\n+2\n10")]
        );
    }

    #[test]
    fn test_named_event_without_space() {
        assert_eq!(
            decode_all(b"event: example2\ndata:example-data\n\n"),
            vec![ServerSentEvent::new("example2", "example-data")]
        );
    }

    #[test]
    fn test_comment_is_ignored() {
        assert_eq!(
            decode_all(b": comment\nevent: example3\ndata: example-data\n\n"),
            vec![ServerSentEvent::new("example3", "example-data")]
        );
        assert_eq!(
            decode_all(b": comment\n\ndata: example-data\n\n"),
            vec![ServerSentEvent::message("example-data")]
        );
    }

    #[test]
    fn test_bare_and_empty_data_fields() {
        assert_eq!(decode_all(b"data\n\n"), vec![ServerSentEvent::message("")]);
        assert_eq!(decode_all(b"data\ndata\n\n"), vec![ServerSentEvent::message("\n")]);
        assert_eq!(decode_all(b"data:\n\n"), vec![ServerSentEvent::message("")]);
    }

    #[test]
    fn test_blank_line_without_data_dispatches_nothing() {
        assert!(decode_all(b"\n\n\n").is_empty());
        assert!(decode_all(b"event: lonely\n\n").is_empty());
    }

    #[test]
    fn test_event_type_does_not_leak_into_next_event() {
        assert_eq!(
            decode_all(b"event: lonely\n\ndata: x\n\n"),
            vec![ServerSentEvent::message("x")]
        );
        assert_eq!(
            decode_all(b"event: a\ndata: 1\n\ndata: 2\n\n"),
            vec![ServerSentEvent::new("a", "1"), ServerSentEvent::message("2")]
        );
    }

    #[test]
    fn test_unterminated_event_is_discarded() {
        assert!(decode_all(b"data: never dispatched\n").is_empty());
        assert!(decode_all(b"data: no newline at all").is_empty());
    }

    #[test]
    fn test_line_terminators() {
        let expected = vec![ServerSentEvent::new("t", "a\nb")];
        assert_eq!(decode_all(b"event: t\r\ndata: a\r\ndata: b\r\n\r\n"), expected);
        assert_eq!(decode_all(b"event: t\rdata: a\rdata: b\r\r"), expected);
        assert_eq!(decode_all(b"event: t\ndata: a\rdata: b\r\n\n"), expected);
    }

    #[test]
    fn test_trailing_cr_at_end_of_input() {
        assert!(decode_all(b"data: test\r").is_empty());
        assert_eq!(decode_all(b"data: test\r\r"), vec![ServerSentEvent::message("test")]);
    }

    #[test]
    fn test_trailing_cr_dispatches_without_more_input() {
        let mut decoder = EventDecoder::new();
        assert_eq!(
            decoder.feed(b"data: x\r\r"),
            vec![ServerSentEvent::message("x")]
        );
        assert!(!decoder.is_finished());
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"data: a\r").is_empty());
        // The LF completes the CRLF above rather than ending an empty line.
        assert!(decoder.feed(b"\n").is_empty());
        assert_eq!(
            decoder.feed(b"data: b\r\n\r\n"),
            vec![ServerSentEvent::message("a\nb")]
        );

        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"data: a\r").is_empty());
        assert_eq!(
            decoder.feed(b"\ndata: b\n\n"),
            vec![ServerSentEvent::message("a\nb")]
        );
    }

    #[test]
    fn test_only_one_lf_follows_a_split_cr() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"data: a\r").is_empty());
        assert_eq!(decoder.feed(b"\n\n"), vec![ServerSentEvent::message("a")]);
    }

    #[test]
    fn test_chunks_split_anywhere() {
        let input = b"event: split\r\ndata: h\xC3\xA9llo\r\n\r\n";
        for at in 0..=input.len() {
            let mut decoder = EventDecoder::new();
            let mut events = decoder.feed(&input[..at]);
            events.extend(decoder.feed(&input[at..]));
            assert_eq!(
                events,
                vec![ServerSentEvent::new("split", "h\u{e9}llo")],
                "split at {at}"
            );
        }
    }

    #[test]
    fn test_bom_is_skipped() {
        assert_eq!(
            decode_all(b"\xEF\xBB\xBFdata: test\n\n"),
            vec![ServerSentEvent::message("test")]
        );

        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"\xEF\xBB").is_empty());
        assert_eq!(
            decoder.feed(b"\xBFdata: test\n\n"),
            vec![ServerSentEvent::message("test")]
        );
    }

    #[test]
    fn test_bom_only_skipped_at_start() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.feed(b"data: a\n\n").len() == 1);
        let events = decoder.feed(b"\xEF\xBB\xBFdata: b\n\n");
        assert!(events.is_empty(), "BOM mid-stream is part of a field name");
    }

    #[test]
    fn test_decode_line() {
        let mut decoder = EventDecoder::new();
        assert!(decoder.decode_line("event: manual").is_none());
        assert!(decoder.decode_line("data: one").is_none());
        assert!(decoder.decode_line("unknown: field").is_none());
        assert_eq!(
            decoder.decode_line(""),
            Some(ServerSentEvent::new("manual", "one"))
        );
    }

    #[test]
    fn test_input_after_finish_is_ignored() {
        let mut decoder = EventDecoder::new();
        decoder.finish();
        assert!(decoder.is_finished());
        assert!(decoder.feed(b"data: late\n\n").is_empty());

        decoder.reset();
        assert!(!decoder.is_finished());
        assert!(decoder.feed(b"data: cut\r").is_empty());
        decoder.reset();
        assert!(decoder.feed(b"\n").is_empty());
        assert_eq!(decoder.feed(b"data: fresh\n\n"), vec![ServerSentEvent::message("fresh")]);
    }
}
