//! Event source client
//!
//! Connects to an SSE endpoint, prints every event and reconnects forever.
//! Stops on Ctrl-C.
//!
//! Run with: `cargo run -p hpx-sse --example event_source -- http://127.0.0.1:8080/events`
//! (start `heartbeat_server` first for a local endpoint).

use async_trait::async_trait;
use hpx_sse::{
    EventSource, HttpConnector, HttpSourceConfig, ServerSentEvent, SseError, Subscriber,
};
use tracing_subscriber::EnvFilter;

/// Prints what the source reports.
struct Printer {
    received: u64,
}

#[async_trait]
impl Subscriber for Printer {
    async fn on_open(&mut self) {
        tracing::info!("Connected");
    }

    async fn on_message(&mut self, event: ServerSentEvent) {
        self.received += 1;
        println!("[{}] {}", self.received, event);
    }

    async fn on_error(&mut self, error: SseError) {
        tracing::warn!(%error, "Stream failed, retrying");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8080/events".to_string());

    let connector = HttpConnector::new(HttpSourceConfig::new(url))?;
    let source = EventSource::new(connector, Printer { received: 0 });

    tokio::signal::ctrl_c().await?;
    source.close();
    source.closed().await;
    tracing::info!("Closed");

    Ok(())
}
