use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::sync::config::RetryOptions;
use crate::sync::{Result, SyncError};

/// Per-attempt timeout; a timed-out attempt counts as transient
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client wrapper shared by all provider clients.
///
/// One retry policy lives here so provider code only supplies a base URL
/// and default headers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    retry: RetryOptions,
}

impl HttpClient {
    /// Create a client with default headers and retry policy
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, HeaderMap::new(), RetryOptions::default())
    }

    pub fn with_options(
        base_url: impl Into<String>,
        headers: HeaderMap,
        retry: RetryOptions,
    ) -> Self {
        let client = Client::builder()
            .user_agent(concat!("cinedex/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            retry,
        }
    }

    /// Build full URL from endpoint
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Execute GET request and parse JSON response
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        self.send(|| self.client.get(&url)).await
    }

    /// Execute GET request with query parameters.
    ///
    /// Repeated keys are serialized as repeated pairs, which covers the
    /// MangaDex `key[]=value` convention.
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let url = self.url(endpoint);
        self.send(|| self.client.get(&url).query(params)).await
    }

    /// Execute POST request with JSON body
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(endpoint);
        self.send(|| self.client.post(&url).json(body)).await
    }

    /// Execute PUT request with JSON body
    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(endpoint);
        self.send(|| self.client.put(&url).json(body)).await
    }

    /// Execute DELETE request
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        self.send(|| self.client.delete(&url)).await
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// The builder closure produces a fresh request per attempt.
    async fn send<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if !status.is_success() {
                        if attempt < self.retry.attempts
                            && self.retry.retry_on_status.contains(&status.as_u16())
                        {
                            self.backoff(attempt).await;
                            attempt += 1;
                            continue;
                        }

                        let message = response.text().await.unwrap_or_default();
                        return Err(SyncError::Api {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| SyncError::Parse(format!("JSON parse error: {e}")));
                }
                Err(err) => {
                    if attempt < self.retry.attempts && is_transient(&err) {
                        self.backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(SyncError::Network(err));
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay_ms = self.retry.backoff_ms * 2u64.pow(attempt);
        sleep(Duration::from_millis(delay_ms)).await;
    }
}

/// Timeouts, connection failures and request-layer errors are worth retrying
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
