use crate::{config::RequestDefaults, error::TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use evm_portal_types::WireRequest;
use futures::{stream::BoxStream, StreamExt as _};
use reqwest::{Client, Url};
use tracing::{instrument, warn};

/// The decoded outcome of a `POST finalized-stream` call (spec §4.7).
pub enum StreamResponse {
    /// No data at or after the requested block yet (`204`).
    NoContent,
    /// A `200 OK` streaming newline-delimited JSON blocks.
    Ok(BoxStream<'static, Result<Bytes, TransportError>>),
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoContent => f.write_str("StreamResponse::NoContent"),
            Self::Ok(_) => f.write_str("StreamResponse::Ok(..)"),
        }
    }
}

/// The HTTP operations the streaming client needs, abstracted behind a trait
/// so it stays transport-agnostic and unit-testable against a fake (spec
/// §4.7, §9).
#[async_trait]
pub trait Transport: std::fmt::Debug + Send + Sync {
    /// `GET <base>/finalized-stream/height`.
    async fn get_height(&self, url: &Url) -> Result<u64, TransportError>;

    /// `POST <base>/finalized-stream` with `body` as the JSON request.
    async fn post_stream(&self, url: &Url, body: &WireRequest) -> Result<StreamResponse, TransportError>;
}

/// [`Transport`] over a real `reqwest::Client`, with retry/backoff on
/// connect-level failures only — a fatal HTTP status is a semantic error,
/// never retried here.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    defaults: RequestDefaults,
}

impl ReqwestTransport {
    /// Build a transport over an existing `reqwest::Client`.
    pub fn new(client: Client, defaults: RequestDefaults) -> Self {
        Self { client, defaults }
    }

    async fn with_retry<F, Fut, T>(&self, op: F) -> Result<T, TransportError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, TransportError>>,
    {
        let retry = &self.defaults.retry;
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < retry.max_retries && e.is_connect_level() => {
                    let delay = (retry.base_delay * 2u32.pow(attempt.min(16))).min(retry.max_delay);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying after connect-level failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self))]
    async fn get_height(&self, url: &Url) -> Result<u64, TransportError> {
        self.with_retry(|| async {
            let mut req = self.client.get(url.clone()).headers(self.defaults.headers.clone());
            if let Some(timeout) = self.defaults.timeout {
                req = req.timeout(timeout);
            }
            let resp = req.send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }
            let text = resp.text().await?;
            text.trim().parse::<u64>().map_err(|_| TransportError::InvalidHeight(text))
        })
        .await
    }

    #[instrument(skip(self, body))]
    async fn post_stream(&self, url: &Url, body: &WireRequest) -> Result<StreamResponse, TransportError> {
        self.with_retry(|| async {
            let mut req =
                self.client.post(url.clone()).headers(self.defaults.headers.clone()).json(body);
            if let Some(timeout) = self.defaults.timeout {
                req = req.timeout(timeout);
            }
            let resp = req.send().await?;
            match resp.status().as_u16() {
                204 => Ok(StreamResponse::NoContent),
                200 => {
                    let stream = resp.bytes_stream().map(|item| item.map_err(TransportError::from));
                    Ok(StreamResponse::Ok(Box::pin(stream)))
                }
                other => Err(TransportError::Status(other)),
            }
        })
        .await
    }
}
