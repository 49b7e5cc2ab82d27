//! The push interface an [`EventSource`](crate::EventSource) reports to.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures_core::Stream;
use tokio::sync::mpsc;

use crate::{error::SseError, event::ServerSentEvent};

/// Receives the lifecycle and messages of one event source.
///
/// The event source owns its subscriber and calls it from a single background
/// task, awaiting every call before it reads further. A slow subscriber
/// therefore throttles the stream rather than piling up events, and calls for
/// one source never overlap.
#[async_trait]
pub trait Subscriber: Send + 'static {
    /// Called once per successful connect, before any event is read.
    ///
    /// Default implementation does nothing.
    async fn on_open(&mut self) {}

    /// Called once per dispatched event, in stream order.
    async fn on_message(&mut self, event: ServerSentEvent);

    /// Called once per failed connect or failed read.
    ///
    /// Never called when the server ends the stream cleanly, and never
    /// called for cancellation. Default implementation does nothing.
    async fn on_error(&mut self, _error: SseError) {}
}

/// Notification forwarded by a [`ChannelSubscriber`].
#[derive(Debug)]
pub enum SourceEvent {
    /// The connection was (re-)established.
    Open,
    /// An event was dispatched.
    Message(ServerSentEvent),
    /// A connect or read failed; a reconnect follows.
    Error(SseError),
}

impl SourceEvent {
    /// Returns the event if this is a message.
    pub fn into_message(self) -> Option<ServerSentEvent> {
        match self {
            Self::Message(event) => Some(event),
            _ => None,
        }
    }
}

/// [`Subscriber`] that forwards every notification into a bounded channel.
///
/// The channel bound becomes the backpressure limit of the source.
#[derive(Debug)]
pub struct ChannelSubscriber {
    tx: mpsc::Sender<SourceEvent>,
}

impl ChannelSubscriber {
    /// Create a subscriber and the receiver its notifications arrive on.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, EventReceiver { rx })
    }

    async fn forward(&self, event: SourceEvent) {
        // A dropped receiver only means nobody listens any more; the owning
        // source is shut down through its own handle.
        let _ = self.tx.send(event).await;
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn on_open(&mut self) {
        self.forward(SourceEvent::Open).await;
    }

    async fn on_message(&mut self, event: ServerSentEvent) {
        self.forward(SourceEvent::Message(event)).await;
    }

    async fn on_error(&mut self, error: SseError) {
        self.forward(SourceEvent::Error(error)).await;
    }
}

/// Stream of [`SourceEvent`]s produced by a [`ChannelSubscriber`].
///
/// Ends once the event source has closed.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<SourceEvent>,
}

impl EventReceiver {
    /// Receive the next notification.
    pub async fn recv(&mut self) -> Option<SourceEvent> {
        self.rx.recv().await
    }

    /// Receive the next dispatched event, skipping open and error
    /// notifications.
    pub async fn next_message(&mut self) -> Option<ServerSentEvent> {
        while let Some(event) = self.rx.recv().await {
            if let SourceEvent::Message(event) = event {
                return Some(event);
            }
        }
        None
    }
}

impl Stream for EventReceiver {
    type Item = SourceEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll_recv(cx)
    }
}
