//! Auto-reconnecting SSE client.
//!
//! [`EventSource`] runs one background task per instance:
//!
//! ```text
//! EventSource::new(connector, subscriber)
//!   └─ tokio::spawn(driver) ──► loop {
//!        Connecting ── connect() ──► Open ── on_open() ── read events ── on_message()*
//!            ▲                                   │
//!            ├──────── stream ended ◄────────────┤  (immediate, silent)
//!            └── sleep(3s) ◄── on_error() ◄──────┘  (connect or read failure)
//!      }
//!   cancel (close/drop) at any await ──► Closed
//! ```
//!
//! The connection itself comes from a [`Connect`] implementation; the
//! optional [`HttpConnector`] (feature `http-client`) is one.

mod body;
mod connect;

#[cfg(feature = "http-client")]
mod config;
#[cfg(feature = "http-client")]
mod client;

use std::{fmt, time::Duration};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[cfg(feature = "http-client")]
pub use self::{config::HttpSourceConfig, client::HttpConnector};
use self::body::SharedBody;
pub use self::connect::{ByteStream, CompletionMode, Connect};
use crate::{
    error::{SseError, SseResult},
    parse::EventStream,
    subscriber::{ChannelSubscriber, EventReceiver, Subscriber},
};

/// Fixed delay between a failed connect or read and the next attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Externally observable lifecycle phase of an [`EventSource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    /// Connecting, or waiting to reconnect.
    Connecting,
    /// Reading events from an established connection.
    Open,
    /// Cancelled. Terminal.
    Closed,
}

impl ReadyState {
    /// Returns `true` if events are being read.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if the source has shut down for good.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// An auto-reconnecting Server-Sent Events client.
///
/// Construction spawns the background task on the current Tokio runtime.
/// Dropping the source, or calling [`close`](Self::close), cancels it: the
/// open response is dropped before the call returns, and the task never
/// calls the subscriber again. Neither waits for the task to finish; use
/// [`closed`](Self::closed) for that.
///
/// ```rust,no_run
/// use hpx_sse::{EventSource, HttpConnector, HttpSourceConfig, SourceEvent};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = HttpConnector::new(HttpSourceConfig::new("https://example.com/events"))?;
/// let (source, mut events) = EventSource::channel(connector, 64);
///
/// while let Some(event) = events.recv().await {
///     match event {
///         SourceEvent::Open => println!("connected"),
///         SourceEvent::Message(event) => println!("{}: {}", event.event_type(), event.data()),
///         SourceEvent::Error(err) => eprintln!("stream failed: {err}"),
///     }
/// }
/// # drop(source);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EventSource {
    cancel: CancellationToken,
    state: watch::Receiver<ReadyState>,
    body: SharedBody,
}

impl EventSource {
    /// Start reading from `connector`, reporting to `subscriber`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new<C, S>(connector: C, subscriber: S) -> Self
    where
        C: Connect,
        S: Subscriber,
    {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ReadyState::Connecting);
        let body = SharedBody::default();

        tokio::spawn(
            Driver {
                connector,
                subscriber,
                cancel: cancel.clone(),
                state: state_tx,
                body: body.clone(),
                connections: 0,
            }
            .run(),
        );

        Self {
            cancel,
            state: state_rx,
            body,
        }
    }

    /// Start reading from `connector`, forwarding every notification to the
    /// returned receiver.
    ///
    /// `capacity` bounds the channel, and with it how far the source may read
    /// ahead of the consumer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or if called outside of a Tokio runtime.
    pub fn channel<C: Connect>(connector: C, capacity: usize) -> (Self, EventReceiver) {
        let (subscriber, receiver) = ChannelSubscriber::new(capacity);
        (Self::new(connector, subscriber), receiver)
    }

    /// The current lifecycle phase.
    pub fn ready_state(&self) -> ReadyState {
        *self.state.borrow()
    }

    /// A receiver observing every lifecycle transition.
    pub fn state_changes(&self) -> watch::Receiver<ReadyState> {
        self.state.clone()
    }

    /// Cancel the source without dropping it.
    pub fn close(&self) {
        self.cancel.cancel();
        if self.body.release() {
            debug!("SSE response released");
        }
    }

    /// Returns `true` once the background task has observed cancellation.
    pub fn is_closed(&self) -> bool {
        self.ready_state().is_closed()
    }

    /// Wait until the background task has shut down.
    ///
    /// Resolves only after [`close`](Self::close) was called (or the runtime
    /// dropped the task).
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        // An error means the task is gone, which is just as closed.
        let _ = state.wait_for(ReadyState::is_closed).await;
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        self.close();
    }
}

// ---------------------------------------------------------------------------
// Internal: background driver
// ---------------------------------------------------------------------------

/// State owned by the background task of one [`EventSource`].
struct Driver<C, S> {
    connector: C,
    subscriber: S,
    cancel: CancellationToken,
    state: watch::Sender<ReadyState>,
    body: SharedBody,
    connections: u64,
}

impl<C: Connect, S: Subscriber> Driver<C, S> {
    async fn run(mut self) {
        let cancel = self.cancel.clone();

        loop {
            if cancel.is_cancelled() {
                break;
            }
            self.set_state(ReadyState::Connecting);

            let result = tokio::select! {
                biased;

                () = cancel.cancelled() => break,
                result = self.connect_and_read() => result,
            };

            self.body.release();

            match result {
                Ok(()) if cancel.is_cancelled() => break,
                Ok(()) => {
                    warn!(connection = self.connections, "SSE stream ended, reconnecting");
                }
                Err(err) if err.is_cancelled() || cancel.is_cancelled() => break,
                Err(err) => {
                    error!(connection = self.connections, error = %err, "SSE connection failed");
                    self.set_state(ReadyState::Connecting);

                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => break,
                        () = self.subscriber.on_error(err) => {}
                    }

                    warn!(
                        delay_ms = RECONNECT_DELAY.as_millis() as u64,
                        "SSE reconnecting after delay"
                    );
                    tokio::select! {
                        biased;

                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }

        self.set_state(ReadyState::Closed);
        info!(connections = self.connections, "SSE event source closed");
    }

    /// One connect-and-read cycle. `Ok` means the server ended the stream.
    async fn connect_and_read(&mut self) -> SseResult<()> {
        self.connections += 1;
        info!(connection = self.connections, "SSE connecting");

        let body = self
            .connector
            .connect(CompletionMode::HeadersRead, self.cancel.clone())
            .await?;

        // Installed before the cancel check: a close racing this connect
        // either sees the body in the slot or has already cancelled.
        let mut events = EventStream::new(self.body.install(body));
        if self.cancel.is_cancelled() {
            return Err(SseError::Cancelled);
        }

        self.set_state(ReadyState::Open);
        info!(connection = self.connections, "SSE connection established");
        self.subscriber.on_open().await;

        while let Some(event) = events.next().await {
            let event = event?;
            // A released body ends the stream early; nothing more is delivered.
            if self.cancel.is_cancelled() {
                return Err(SseError::Cancelled);
            }
            debug!(
                event_type = %event.event_type,
                len = event.data.len(),
                "SSE event received"
            );
            self.subscriber.on_message(event).await;
        }

        Ok(())
    }

    fn set_state(&self, state: ReadyState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "SSE ready state changed");
        }
    }
}
