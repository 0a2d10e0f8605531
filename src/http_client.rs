use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::error::{CheckerError, LoadError};

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Verify TLS certificates
    pub verify_certificates: bool,
    /// Number of retry attempts
    pub retry_attempts: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds (for exponential backoff cap)
    pub max_retry_delay_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            verify_certificates: true,
            retry_attempts: 0,
            retry_delay_ms: 1000,
            max_retry_delay_ms: 30000,
            user_agent: format!("schema-refcheck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Raw response of a GET, before any schema checks
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Transport seam used by the loader.
///
/// Implementations return any HTTP response as `Ok`; only transport failures
/// (timeouts, connection errors, unreadable bodies) are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, LoadError>;
}

/// Async HTTP client for downloading remote schema documents
pub struct AsyncHttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl AsyncHttpClient {
    /// Create a new async HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self, CheckerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_certificates)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self { client, config })
    }

    /// GET a URL, retrying transient failures with exponential backoff
    async fn get_with_retry(&self, url: &str) -> Result<Response, LoadError> {
        let mut current_attempt = 0;

        loop {
            match self.make_request(url).await {
                Ok(response) => {
                    // Retry on server errors (5xx) but hand every other status to the caller
                    if response.status().is_server_error()
                        && current_attempt < self.config.retry_attempts
                    {
                        debug!(url, status = response.status().as_u16(), "retrying");
                        self.wait_before_retry(current_attempt).await;
                        current_attempt += 1;
                        continue;
                    }
                    return Ok(response);
                }
                Err(error) => {
                    if current_attempt < self.config.retry_attempts
                        && self.is_retryable_error(&error)
                    {
                        debug!(url, %error, "retrying");
                        self.wait_before_retry(current_attempt).await;
                        current_attempt += 1;
                        continue;
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Make a single HTTP request with timeout
    async fn make_request(&self, url: &str) -> Result<Response, LoadError> {
        let request_future = self.client.get(url).send();

        timeout(
            Duration::from_secs(self.config.timeout_seconds),
            request_future,
        )
        .await
        .map_err(|_| LoadError::Timeout {
            url: url.to_string(),
            timeout_seconds: self.config.timeout_seconds,
        })?
        .map_err(|e| self.transport_error(url, e))
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> LoadError {
        if error.is_timeout() {
            LoadError::Timeout {
                url: url.to_string(),
                timeout_seconds: self.config.timeout_seconds,
            }
        } else {
            LoadError::Fetch {
                url: url.to_string(),
                status: error.status().map(|s| s.as_u16()),
                cause: error.to_string(),
            }
        }
    }

    /// Wait before retry with exponential backoff
    async fn wait_before_retry(&self, attempt: u32) {
        sleep(self.backoff_delay(attempt)).await;
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay_ms = self.config.retry_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.config.max_retry_delay_ms))
    }

    /// Check if an error is retryable
    fn is_retryable_error(&self, error: &LoadError) -> bool {
        match error {
            LoadError::Timeout { .. } => true,
            LoadError::Fetch { status, .. } => status.is_none(),
            _ => false,
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl DocumentFetcher for AsyncHttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, LoadError> {
        let response = self.get_with_retry(url).await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        Ok(FetchedDocument {
            url: url.to_string(),
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_creation() {
        let config = HttpClientConfig::default();
        let client = AsyncHttpClient::new(config);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_http_client_without_certificate_checks() {
        let config = HttpClientConfig {
            verify_certificates: false,
            ..Default::default()
        };
        let client = AsyncHttpClient::new(config).unwrap();
        assert!(!client.config().verify_certificates);
    }

    #[tokio::test]
    async fn test_exponential_backoff_is_capped() {
        let config = HttpClientConfig {
            retry_delay_ms: 20,
            max_retry_delay_ms: 50,
            ..Default::default()
        };
        let client = AsyncHttpClient::new(config).unwrap();

        let start = std::time::Instant::now();
        client.wait_before_retry(0).await; // ~20ms
        let first_delay = start.elapsed();

        let start = std::time::Instant::now();
        client.wait_before_retry(3).await; // 160ms capped to 50ms
        let capped_delay = start.elapsed();

        assert!(first_delay >= Duration::from_millis(20));
        assert!(capped_delay >= Duration::from_millis(50));
        assert!(capped_delay < Duration::from_millis(160));
    }

    #[test]
    fn test_backoff_saturates_on_large_delays() {
        let config = HttpClientConfig {
            retry_delay_ms: u64::MAX / 2,
            max_retry_delay_ms: 30000,
            ..Default::default()
        };
        let client = AsyncHttpClient::new(config).unwrap();

        assert_eq!(client.backoff_delay(5), Duration::from_millis(30000));
        assert_eq!(client.backoff_delay(80), Duration::from_millis(30000));
    }

    #[tokio::test]
    async fn test_retryable_error_detection() {
        let client = AsyncHttpClient::new(HttpClientConfig::default()).unwrap();

        let timeout_error = LoadError::Timeout {
            url: "http://example.com".to_string(),
            timeout_seconds: 30,
        };
        assert!(client.is_retryable_error(&timeout_error));

        let connect_error = LoadError::Fetch {
            url: "http://example.com".to_string(),
            status: None,
            cause: "connection refused".to_string(),
        };
        assert!(client.is_retryable_error(&connect_error));

        let parse_error = LoadError::Parse {
            source_name: "http://example.com".to_string(),
            details: "Invalid XML".to_string(),
        };
        assert!(!client.is_retryable_error(&parse_error));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let config = HttpClientConfig {
            timeout_seconds: 5,
            ..Default::default()
        };
        let client = AsyncHttpClient::new(config).unwrap();

        // Port 9 (discard) on localhost is not expected to serve HTTP
        let result = client.fetch("http://127.0.0.1:9/schema.xml").await;
        match result.unwrap_err() {
            LoadError::Fetch { status, .. } => assert_eq!(status, None),
            LoadError::Timeout { .. } => (),
            other => panic!("Expected transport error, got {:?}", other),
        }
    }
}
