//! # hpx-sse
//!
//! Server-Sent Events for Tokio: a lenient event-stream decoder, an
//! auto-reconnecting client and a server-side writer.
//!
//! ## Client
//!
//! An [`EventSource`] owns a [`Connect`] implementation and a [`Subscriber`].
//! It connects, reports `on_open`, parses the response into
//! [`ServerSentEvent`]s delivered through `on_message`, and reconnects forever:
//! right away when the server ends the stream, after [`RECONNECT_DELAY`] when a
//! connect or read fails (reported through `on_error`). Dropping it stops
//! everything.
//!
//! ```rust,no_run
//! use hpx_sse::{EventSource, HttpConnector, HttpSourceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = HttpConnector::new(HttpSourceConfig::new("http://localhost:8080/events"))?;
//! let (_source, mut events) = EventSource::channel(connector, 64);
//!
//! while let Some(event) = events.next_message().await {
//!     println!("{event}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Server
//!
//! [`EventWriter`] writes a stream of events to any [`tokio::io::AsyncWrite`],
//! flushing after each one; [`encode_stream`] produces body chunks for HTTP
//! frameworks instead. [`heartbeat`](heartbeat::heartbeat) is a ready-made
//! keep-alive source.
//!
//! ## Features
//!
//! - `http-client` (default): [`HttpConnector`], a `reqwest`-based [`Connect`].

pub mod error;
pub mod event;
pub mod heartbeat;
pub mod parse;
pub mod source;
pub mod subscriber;
pub mod writer;

pub use error::{SseError, SseResult};
pub use event::ServerSentEvent;
pub use heartbeat::{HEARTBEAT_PERIOD, heartbeat};
pub use parse::{EventBuilder, EventDecoder, EventStream};
#[cfg(feature = "http-client")]
pub use source::{HttpConnector, HttpSourceConfig};
pub use source::{
    ByteStream, CompletionMode, Connect, EventSource, RECONNECT_DELAY, ReadyState,
};
pub use subscriber::{ChannelSubscriber, EventReceiver, SourceEvent, Subscriber};
pub use writer::{EventWriter, MEDIA_TYPE, encode_event, encode_event_into, encode_stream};
