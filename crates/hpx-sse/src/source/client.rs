//! [`Connect`] implementation over HTTP.

use async_trait::async_trait;
use futures_util::{TryStreamExt, stream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{
    config::HttpSourceConfig,
    connect::{ByteStream, CompletionMode, Connect},
};
use crate::{
    error::{SseError, SseResult},
    writer::MEDIA_TYPE,
};

/// Opens SSE responses with `reqwest`.
///
/// Every request carries `Accept: text/event-stream` and
/// `Cache-Control: no-cache` on top of the configured headers. A response is
/// accepted only with a 2xx status and, if the server sends a `Content-Type`
/// at all, a `text/event-stream` one.
#[derive(Clone, Debug)]
pub struct HttpConnector {
    client: reqwest::Client,
    config: HttpSourceConfig,
}

impl HttpConnector {
    /// Create a connector with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the client cannot
    /// be built.
    pub fn new(config: HttpSourceConfig) -> SseResult<Self> {
        config.validate().map_err(SseError::config)?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SseError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create a connector that shares an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_client(client: reqwest::Client, config: HttpSourceConfig) -> SseResult<Self> {
        config.validate().map_err(SseError::config)?;
        Ok(Self { client, config })
    }

    /// The configuration requests are built from.
    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    async fn send(&self) -> SseResult<reqwest::Response> {
        let mut headers = self.config.headers.clone();
        headers.insert(
            http::header::ACCEPT,
            http::HeaderValue::from_static(MEDIA_TYPE),
        );
        headers.insert(
            http::header::CACHE_CONTROL,
            http::HeaderValue::from_static("no-cache"),
        );

        let mut req = self
            .client
            .request(self.config.method.clone(), &self.config.url)
            .headers(headers);
        if let Some(body) = &self.config.body {
            req = req.body(body.clone());
        }

        let resp = timeout(self.config.connect_timeout, req.send())
            .await
            .map_err(|_| SseError::timeout(self.config.connect_timeout))??;

        let status = resp.status();
        if !status.is_success() {
            return Err(SseError::invalid_status(status));
        }

        if let Some(ct) = resp.headers().get(http::header::CONTENT_TYPE) {
            let ct_str = ct.to_str().unwrap_or("");
            if !ct_str.contains(MEDIA_TYPE) {
                return Err(SseError::invalid_content_type(ct_str));
            }
        }

        Ok(resp)
    }
}

#[async_trait]
impl Connect for HttpConnector {
    async fn connect(
        &self,
        mode: CompletionMode,
        cancel: CancellationToken,
    ) -> SseResult<ByteStream> {
        debug!(url = %self.config.url, method = %self.config.method, ?mode, "Sending SSE request");

        let resp = tokio::select! {
            biased;

            () = cancel.cancelled() => return Err(SseError::Cancelled),
            resp = self.send() => resp?,
        };

        match mode {
            CompletionMode::HeadersRead => {
                Ok(Box::pin(resp.bytes_stream().map_err(SseError::from)))
            }
            CompletionMode::ContentRead => {
                let body = tokio::select! {
                    biased;

                    () = cancel.cancelled() => return Err(SseError::Cancelled),
                    body = resp.bytes() => body?,
                };
                debug!(len = body.len(), "SSE response body buffered");
                Ok(Box::pin(stream::iter([Ok::<_, SseError>(body)])))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = HttpConnector::new(HttpSourceConfig::default()).expect_err("empty URL");
        assert!(matches!(err, SseError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: URL cannot be empty");
    }

    #[test]
    fn test_with_client_keeps_config() {
        let connector = HttpConnector::with_client(
            reqwest::Client::new(),
            HttpSourceConfig::new("http://127.0.0.1:1/events"),
        )
        .expect("valid config");
        assert_eq!(connector.config().url, "http://127.0.0.1:1/events");
    }

    #[tokio::test]
    async fn test_cancelled_before_connect() {
        let connector =
            HttpConnector::new(HttpSourceConfig::new("http://127.0.0.1:1/events")).expect("valid");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = connector.connect(CompletionMode::HeadersRead, cancel).await;
        assert!(matches!(result, Err(SseError::Cancelled)));
    }
}
