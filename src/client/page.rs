//! Page client module
//!
//! Provides `PageClient` for fetching a document over HTTP GET.

use crate::error::EtlError;

use eyre::Result;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// HTTP client for fetching web pages.
///
/// Every request is bounded by the timeout given at construction. Transport
/// timeouts, connection failures and 5xx responses are retried up to
/// `retries` times; anything else fails immediately.
///
/// # Example
/// ```no_run
/// use bank_etl::client::PageClient;
/// use std::time::Duration;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let client = PageClient::try_new(Duration::from_secs(30), 1)?;
/// let url = Url::parse("https://example.com/")?;
/// let html = client.fetch(&url).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PageClient {
    client: Client,
    retries: u32,
}

impl PageClient {
    /// Create a new PageClient
    ///
    /// # Errors
    /// Returns a `NetworkError` if the HTTP client cannot be built
    pub fn try_new(timeout: Duration, retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EtlError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, retries })
    }

    /// GET a URL and return the response body as text.
    ///
    /// # Errors
    /// Returns a `NetworkError` on transport failure or a non-2xx status
    /// once the retries are used up.
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(failure) if failure.transient && attempt <= self.retries => {
                    log::warn!(
                        "Attempt {} to fetch {} failed, retrying: {}",
                        attempt,
                        url,
                        failure.message
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(failure) => return Err(EtlError::Network(failure.message).into()),
            }
        }
    }

    async fn fetch_once(&self, url: &Url) -> std::result::Result<String, FetchFailure> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchFailure {
                transient: e.is_timeout() || e.is_connect(),
                message: format!("Request to {} failed: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure {
                transient: status.is_server_error(),
                message: format!("Request to {} returned {}", url, describe(status)),
            });
        }

        response.text().await.map_err(|e| FetchFailure {
            transient: e.is_timeout(),
            message: format!("Failed to read response body from {}: {}", url, e),
        })
    }
}

struct FetchFailure {
    transient: bool,
    message: String,
}

fn describe(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}
