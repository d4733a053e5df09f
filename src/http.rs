//! Blocking HTTP transport shared by the release index client and the artifact store

use crate::config::NetworkConfig;
use crate::{Error, Result};
use std::thread;
use std::time::Duration;

/// Failure of a single GET, before it is mapped to a domain error
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// Client errors (4xx) will not succeed on retry
    pub retryable: bool,
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
    retries: u32,
    backoff: Duration,
}

impl HttpClient {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&config.user_agent);
        builder = if config.timeout_seconds > 0 {
            builder.timeout(Duration::from_secs(config.timeout_seconds))
        } else {
            builder.timeout(None)
        };

        Ok(Self {
            client: builder.build()?,
            retries: config.retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// GET `url` and return the body, retrying transient failures
    pub fn get_bytes(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        let mut attempt = 0;
        loop {
            match self.try_get(url) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.retryable && attempt < self.retries => {
                    attempt += 1;
                    log::warn!(
                        "GET {} failed ({}), retrying ({}/{})",
                        url,
                        e.message,
                        attempt,
                        self.retries
                    );
                    thread::sleep(self.backoff * attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        log::debug!("GET {}", url);

        let response = self.client.get(url).send().map_err(|e| {
            let message = if e.is_connect() {
                format!("cannot connect to {}", host_of(url))
            } else if e.is_timeout() {
                "request timed out".to_string()
            } else {
                e.to_string()
            };
            TransportError {
                message,
                retryable: true,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError {
                message: format!("HTTP {}", status.as_u16()),
                retryable: !status.is_client_error(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| TransportError {
                message: format!("failed to read response body: {}", e),
                retryable: true,
            })
    }
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Network(e.message)
    }
}
