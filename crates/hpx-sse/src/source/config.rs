//! HTTP event source configuration.

use std::time::Duration;

/// Configuration for [`HttpConnector`](super::HttpConnector).
///
/// Reconnection is not configured here: the event source always retries, after
/// a fixed [`RECONNECT_DELAY`](super::RECONNECT_DELAY) when a connect or read
/// failed and immediately when the server ended the stream.
#[derive(Clone, Debug)]
pub struct HttpSourceConfig {
    /// SSE endpoint URL.
    pub url: String,
    /// HTTP method (usually GET, some APIs use POST).
    pub method: http::Method,
    /// Additional HTTP headers to include with every request.
    pub headers: http::HeaderMap,
    /// Optional request body (for POST-based SSE).
    pub body: Option<Vec<u8>>,
    /// Time allowed for connecting and receiving the response headers.
    pub connect_timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: http::Method::GET,
            headers: http::HeaderMap::new(),
            body: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl HttpSourceConfig {
    /// Create a new configuration for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the HTTP method (e.g., `POST` for POST-based SSE).
    #[must_use]
    pub fn method(mut self, method: http::Method) -> Self {
        self.method = method;
        self
    }

    /// Set additional HTTP headers.
    #[must_use]
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error message string if any field has an invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err("URL must use the http or https scheme".to_string());
        }
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout must be > 0".to_string());
        }
        if self.body.is_some() && self.method == http::Method::GET {
            return Err("GET requests cannot carry a body".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpSourceConfig::default();
        assert!(config.url.is_empty());
        assert_eq!(config.method, http::Method::GET);
        assert!(config.headers.is_empty());
        assert!(config.body.is_none());
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_pattern() {
        let mut headers = http::HeaderMap::new();
        headers.insert("X-Api-Key", "test-key".parse().expect("valid header value"));

        let config = HttpSourceConfig::new("https://example.com/events")
            .method(http::Method::POST)
            .headers(headers)
            .body(b"{\"channels\":[\"news\"]}".to_vec())
            .connect_timeout(Duration::from_secs(30));

        assert_eq!(config.url, "https://example.com/events");
        assert_eq!(config.method, http::Method::POST);
        assert_eq!(
            config
                .headers
                .get("X-Api-Key")
                .map(|v| v.to_str().expect("valid str")),
            Some("test-key")
        );
        assert_eq!(
            config.body.as_deref(),
            Some(b"{\"channels\":[\"news\"]}".as_slice())
        );
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_url() {
        let result = HttpSourceConfig::default().validate();
        assert_eq!(result.expect_err("should fail"), "URL cannot be empty");
    }

    #[test]
    fn test_validation_scheme() {
        let result = HttpSourceConfig::new("ws://example.com").validate();
        assert_eq!(
            result.expect_err("should fail"),
            "URL must use the http or https scheme"
        );
    }

    #[test]
    fn test_validation_zero_timeout() {
        let result = HttpSourceConfig::new("https://example.com")
            .connect_timeout(Duration::ZERO)
            .validate();
        assert_eq!(result.expect_err("should fail"), "Connect timeout must be > 0");
    }

    #[test]
    fn test_validation_get_with_body() {
        let result = HttpSourceConfig::new("https://example.com")
            .body(b"payload".to_vec())
            .validate();
        assert_eq!(
            result.expect_err("should fail"),
            "GET requests cannot carry a body"
        );
    }
}
