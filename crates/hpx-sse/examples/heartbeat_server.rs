//! Heartbeat server
//!
//! Serves an endless `heartbeat` event stream on every request, one event per
//! second, as the streaming body of a hyper HTTP/1.1 response.
//!
//! Run with: `cargo run -p hpx-sse --example heartbeat_server`
//! Then: `curl -N http://127.0.0.1:8080/events`

use std::convert::Infallible;

use futures_util::StreamExt;
use hpx_sse::{HEARTBEAT_PERIOD, MEDIA_TYPE, encode_stream, heartbeat};
use http_body_util::StreamBody;
use hyper::{
    Request, Response,
    body::{Bytes, Frame, Incoming},
    header::{CACHE_CONTROL, CONTENT_TYPE},
    server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

type HeartbeatBody =
    StreamBody<futures_util::stream::BoxStream<'static, Result<Frame<Bytes>, Infallible>>>;

/// Answer any request with heartbeats until `shutdown` is cancelled.
fn heartbeats(
    _req: Request<Incoming>,
    shutdown: CancellationToken,
) -> Result<Response<HeartbeatBody>, hyper::http::Error> {
    let frames = encode_stream(heartbeat(HEARTBEAT_PERIOD))
        .take_until(shutdown.cancelled_owned())
        .map(|chunk| Ok(Frame::data(chunk)))
        .boxed();

    Response::builder()
        .header(CONTENT_TYPE, MEDIA_TYPE)
        .header(CACHE_CONTROL, "no-cache")
        .body(StreamBody::new(frames))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let listener = TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    let shutdown = CancellationToken::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                shutdown.cancel();
                break;
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                tracing::info!(%peer, "Client connected");
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let response = heartbeats(req, shutdown.clone());
                        async move { response }
                    });
                    if let Err(error) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        tracing::info!(%peer, %error, "Client disconnected");
                    }
                });
            }
        }
    }

    Ok(())
}
