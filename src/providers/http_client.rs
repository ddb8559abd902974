use crate::config::HttpConfig;
use crate::error::FetchError;
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

/// One failed attempt. Only `Retryable` attempts are repeated.
#[derive(Debug)]
enum AttemptError {
    Retryable(String),
    Fatal(String),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    fn into_message(self) -> String {
        match self {
            Self::Retryable(m) | Self::Fatal(m) => m,
        }
    }
}

/// reqwest client with polite pacing and bounded retry.
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
    provider: &'static str,
}

impl HttpClient {
    pub fn new(provider: &'static str, user_agent: &str, config: &HttpConfig) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Yahoo hands out a consent cookie on first contact
            .cookie_store(true)
            .build()
            .map_err(|e| FetchError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            config: config.clone(),
            provider,
        })
    }

    /// Send the request built by `make` and return the body as text.
    ///
    /// Transport errors, 429 and 5xx are retried with exponential backoff;
    /// any other non-success status fails immediately.
    pub async fn send_text<F>(&self, what: &str, make: F) -> Result<String, FetchError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        self.polite_delay().await;

        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.config.request_delay_ms.max(1))
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.config.max_retries as usize);

        let make = &make;
        let client = &self.inner;
        let mut attempt = 0u32;
        let attempt = &mut attempt;

        let result = RetryIf::spawn(
            strategy,
            move || {
                *attempt += 1;
                let n = *attempt;
                async move {
                    debug!("{} (attempt {})", what, n);
                    Self::attempt(make(client)).await.inspect_err(|e| {
                        if e.is_retryable() {
                            warn!("{} attempt {} failed: {:?}", what, n, e);
                        }
                    })
                }
            },
            AttemptError::is_retryable,
        )
        .await;

        result.map_err(|e| {
            FetchError::provider(self.provider, format!("{}: {}", what, e.into_message()))
        })
    }

    async fn attempt(request: RequestBuilder) -> Result<String, AttemptError> {
        let resp = request
            .send()
            .await
            .map_err(|e| AttemptError::Retryable(format!("request error: {}", e)))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .text()
                .await
                .map_err(|e| AttemptError::Retryable(format!("failed to read body: {}", e)));
        }

        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Err(AttemptError::Retryable(format!("HTTP {}", status)))
        } else {
            Err(AttemptError::Fatal(format!("HTTP {} {}", status, snippet.trim())))
        }
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let total = Duration::from_millis(self.config.request_delay_ms)
            + jitter(Duration::from_millis(self.config.jitter_ms));
        if !total.is_zero() {
            sleep(total).await;
        }
    }
}
