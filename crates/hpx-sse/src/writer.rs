//! Server-side event-stream encoding.
//!
//! Every event is written as one `event:` line, one `data:` line per payload
//! line and a terminating blank line:
//!
//! ```text
//! event: update\n
//! data: first line\n
//! data: second line\n
//! \n
//! ```

use std::pin::pin;

use bytes::{BufMut, Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{SseError, SseResult},
    event::ServerSentEvent,
    parse::constants::LF,
};

/// Media type of an event stream.
pub const MEDIA_TYPE: &str = "text/event-stream";

const EVENT_PREFIX: &[u8] = b"event: ";
const DATA_PREFIX: &[u8] = b"data: ";

/// Append the wire form of `event` to `buf`.
///
/// The event type is written verbatim. Data is split on `\r\n`, `\r` and `\n`,
/// so readers see the same lines whatever terminators the payload used.
pub fn encode_event_into(event: &ServerSentEvent, buf: &mut BytesMut) {
    buf.reserve(
        EVENT_PREFIX.len() + event.event_type.len() + DATA_PREFIX.len() + event.data.len() + 3,
    );

    buf.put_slice(EVENT_PREFIX);
    buf.put_slice(event.event_type.as_bytes());
    buf.put_u8(LF);

    for line in event.data_lines() {
        buf.put_slice(DATA_PREFIX);
        buf.put_slice(line.as_bytes());
        buf.put_u8(LF);
    }

    buf.put_u8(LF);
}

/// Encode a single event.
pub fn encode_event(event: &ServerSentEvent) -> Bytes {
    let mut buf = BytesMut::new();
    encode_event_into(event, &mut buf);
    buf.freeze()
}

/// Encode a stream of events into a stream of wire chunks, one per event.
///
/// Suited to HTTP frameworks that take a streaming body instead of a sink.
pub fn encode_stream<S>(events: S) -> impl Stream<Item = Bytes>
where
    S: Stream<Item = ServerSentEvent>,
{
    events.map(|event| encode_event(&event))
}

/// Writes events to an async sink, flushing after each one.
#[derive(Debug)]
pub struct EventWriter<W> {
    inner: W,
    buf: BytesMut,
    written: u64,
}

impl<W: AsyncWrite + Unpin> EventWriter<W> {
    /// Wrap a sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
            written: 0,
        }
    }

    /// Write one event and flush the sink.
    ///
    /// # Errors
    ///
    /// Returns [`SseError::Io`] if writing or flushing fails.
    pub async fn write_event(&mut self, event: &ServerSentEvent) -> SseResult<()> {
        self.buf.clear();
        encode_event_into(event, &mut self.buf);

        self.inner.write_all(&self.buf).await?;
        self.inner.flush().await?;

        self.written += 1;
        debug!(
            event_type = %event.event_type,
            len = self.buf.len(),
            written = self.written,
            "SSE event written"
        );
        Ok(())
    }

    /// Write every event of `events` until it ends or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`SseError::Cancelled`] once `cancel` fires, whether the writer
    /// was waiting for the next event or writing one, and [`SseError::Io`] if
    /// the sink fails. Nothing is retried.
    pub async fn write_all<S>(&mut self, events: S, cancel: &CancellationToken) -> SseResult<()>
    where
        S: Stream<Item = ServerSentEvent>,
    {
        let mut events = pin!(events);

        loop {
            let event = tokio::select! {
                biased;

                () = cancel.cancelled() => return Err(SseError::Cancelled),
                event = events.next() => event,
            };
            let Some(event) = event else {
                debug!(written = self.written, "SSE event stream completed");
                return Ok(());
            };

            tokio::select! {
                biased;

                () = cancel.cancelled() => return Err(SseError::Cancelled),
                result = self.write_event(&event) => result?,
            }
        }
    }

    /// Number of events written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
        time::Duration,
    };

    use futures_util::stream;

    use super::*;
    use crate::parse::EventDecoder;

    fn encoded(event: &ServerSentEvent) -> String {
        String::from_utf8(encode_event(event).to_vec()).expect("utf-8 output")
    }

    #[test]
    fn test_encode_single_line() {
        assert_eq!(
            encoded(&ServerSentEvent::new("example2", "example-data")),
            "event: example2\ndata: example-data\n\n"
        );
    }

    #[test]
    fn test_encode_splits_every_line_terminator() {
        assert_eq!(
            encoded(&ServerSentEvent::message("YHOO\r\n+2\r10\nend")),
            "event: message\ndata: YHOO\ndata: +2\ndata: 10\ndata: end\n\n"
        );
    }

    #[test]
    fn test_encode_empty_payload() {
        assert_eq!(
            encoded(&ServerSentEvent::message("")),
            "event: message\ndata: \n\n"
        );
    }

    #[test]
    fn test_encode_into_appends() {
        let mut buf = BytesMut::from(&b": keep-alive\n\n"[..]);
        encode_event_into(&ServerSentEvent::new("tick", "1"), &mut buf);
        assert_eq!(&buf[..], b": keep-alive\n\nevent: tick\ndata: 1\n\n");
    }

    #[test]
    fn test_decoder_reads_back_encoded_events() {
        let events = vec![
            ServerSentEvent::message("plain"),
            ServerSentEvent::new("update", "line one\nline two"),
            ServerSentEvent::new("crlf", "a\r\nb"),
            ServerSentEvent::message(""),
            ServerSentEvent::new("trailing", "x\n"),
        ];

        let mut decoder = EventDecoder::new();
        for event in &events {
            decoder.extend(&encode_event(event));
        }
        let mut decoded = Vec::new();
        while let Some(event) = decoder.next_event() {
            decoded.push(event);
        }

        let normalised: Vec<_> = events
            .iter()
            .map(|e| ServerSentEvent::new(e.event_type.clone(), e.data.replace("\r\n", "\n")))
            .collect();
        assert_eq!(decoded, normalised);
    }

    #[tokio::test]
    async fn test_write_event_flushes_each_event() {
        let mut writer = EventWriter::new(Vec::new());
        writer
            .write_event(&ServerSentEvent::new("a", "1"))
            .await
            .expect("write");
        writer
            .write_event(&ServerSentEvent::new("b", "2"))
            .await
            .expect("write");

        assert_eq!(writer.written(), 2);
        assert_eq!(
            writer.get_ref().as_slice(),
            b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n"
        );
    }

    #[tokio::test]
    async fn test_write_all_until_stream_ends() {
        let events = stream::iter(vec![
            ServerSentEvent::message("first"),
            ServerSentEvent::message("second"),
        ]);
        let mut writer = EventWriter::new(Vec::new());
        writer
            .write_all(events, &CancellationToken::new())
            .await
            .expect("stream completes");

        assert_eq!(
            String::from_utf8(writer.into_inner()).expect("utf-8"),
            "event: message\ndata: first\n\nevent: message\ndata: second\n\n"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_all_cancelled_while_waiting() {
        let cancel = CancellationToken::new();
        let events = stream::iter(vec![ServerSentEvent::message("sent")])
            .chain(stream::pending());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let mut writer = EventWriter::new(Vec::new());
        let result = writer.write_all(events, &cancel).await;

        assert!(matches!(result, Err(SseError::Cancelled)));
        assert_eq!(writer.get_ref().as_slice(), b"event: message\ndata: sent\n\n");
    }

    #[tokio::test]
    async fn test_write_all_cancelled_before_start_writes_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut writer = EventWriter::new(Vec::new());
        let result = writer
            .write_all(stream::iter(vec![ServerSentEvent::message("x")]), &cancel)
            .await;

        assert!(matches!(result, Err(SseError::Cancelled)));
        assert!(writer.get_ref().is_empty());
    }

    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let mut writer = EventWriter::new(BrokenPipe);
        let result = writer
            .write_all(
                stream::iter(vec![ServerSentEvent::message("x")]),
                &CancellationToken::new(),
            )
            .await;

        match result {
            Err(SseError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected I/O error, got {other:?}"),
        }
        assert_eq!(writer.written(), 0);
    }

    #[tokio::test]
    async fn test_encode_stream() {
        let chunks: Vec<Bytes> = encode_stream(stream::iter(vec![
            ServerSentEvent::new("a", "1"),
            ServerSentEvent::new("b", "2"),
        ]))
        .collect()
        .await;

        assert_eq!(
            chunks,
            vec![
                Bytes::from_static(b"event: a\ndata: 1\n\n"),
                Bytes::from_static(b"event: b\ndata: 2\n\n"),
            ]
        );
    }
}
