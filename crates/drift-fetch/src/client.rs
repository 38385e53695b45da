//! reqwest-backed transport.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::{BoxFuture, Transport};

/// Production transport over reqwest.
///
/// Applies the per-request timeout and appends a cache-defeating
/// `_refresh` query parameter so each call bypasses intermediate
/// caches.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value, FetchError>> {
        let url = cache_bust(url);
        Box::pin(async move {
            debug!(%url, "fetching");
            let response = self
                .client
                .get(&url)
                .header("accept", "application/json")
                .send()
                .await
                .map_err(classify_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                debug!(%url, status = status.as_u16(), "non-2xx response");
                return Err(FetchError::Status(status.as_u16()));
            }

            response
                .json::<Value>()
                .await
                .map_err(|e| FetchError::Decode(e.to_string()))
        })
    }
}

/// Append the cache-defeating query parameter.
fn cache_bust(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}_refresh={}", epoch_millis())
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn classify_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Connect(e.to_string())
    }
}
