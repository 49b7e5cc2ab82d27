//! Periodic keep-alive events for the writer.

use std::time::Duration;

use bytes_utils::Str;
use futures_core::Stream;
use futures_util::stream;

use crate::event::ServerSentEvent;

/// Default spacing of heartbeat events.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);

const HEARTBEAT_STR: Str = Str::from_static("heartbeat");

/// An endless stream of `heartbeat` events numbered `0, 1, 2, …`.
///
/// The first event is yielded immediately, every later one `period` after the
/// previous one was taken. Dropping the stream (or cancelling the
/// [`EventWriter`](crate::EventWriter) consuming it) stops it.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use futures_util::StreamExt;
/// use hpx_sse::heartbeat::{HEARTBEAT_PERIOD, heartbeat};
///
/// let first = heartbeat(HEARTBEAT_PERIOD).take(1).collect::<Vec<_>>().await;
/// assert_eq!(first[0].event_type(), "heartbeat");
/// assert_eq!(first[0].data(), "0");
/// # }
/// ```
pub fn heartbeat(period: Duration) -> impl Stream<Item = ServerSentEvent> + Send + 'static {
    stream::unfold(0u64, move |counter| async move {
        if counter > 0 {
            tokio::time::sleep(period).await;
        }
        let event = ServerSentEvent::new(HEARTBEAT_STR, counter.to_string());
        Some((event, counter + 1))
    })
}
