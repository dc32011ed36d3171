use async_trait::async_trait;
use bytes::Bytes;
use evm_portal_client::{StreamResponse, Transport, TransportError};
use evm_portal_types::WireRequest;
use futures::stream::BoxStream;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

/// One piece of a scripted `200` response body, played back in order.
#[derive(Debug, Clone)]
pub enum ScriptedChunk {
    /// A raw chunk of bytes as it would arrive off the wire (NDJSON lines,
    /// possibly split mid-line to exercise the line splitter).
    Data(Vec<u8>),
    /// Pause before the next chunk, to exercise the idle timer.
    Pause(std::time::Duration),
    /// End the body early with a transient read error, to exercise
    /// truncation-triggered resumption.
    TransientError,
}

/// What [`FakeTransport::post_stream`] returns for one scripted call.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// A `204`: no data yet at the requested height.
    NoContent,
    /// A `200` with a scripted, possibly delayed body.
    Ok(Vec<ScriptedChunk>),
    /// A fatal, non-2xx/204 status.
    Status(u16),
}

/// A request the fake transport observed, recorded for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request body's `fromBlock`.
    pub from_block: u64,
    /// The request body's `toBlock`.
    pub to_block: Option<u64>,
}

/// A [`Transport`] driven entirely by a pre-programmed script, for testing
/// `evm-portal-client`'s ingest loop without a live portal (spec §4.7, §8).
///
/// `post_stream` pops one [`ScriptedResponse`] per call, in order; once the
/// script is exhausted, it keeps returning [`ScriptedResponse::NoContent`]
/// (idle at the head) rather than panicking, so tests don't need to script
/// the tail exactly.
#[derive(Debug)]
pub struct FakeTransport {
    height: Mutex<u64>,
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    /// A fake reporting `height` and replaying `responses` in order for
    /// successive `post_stream` calls.
    pub fn new(height: u64, responses: Vec<ScriptedResponse>) -> Self {
        Self { height: Mutex::new(height), responses: Mutex::new(responses.into()), requests: Mutex::new(Vec::new()) }
    }

    /// Update the height returned by `get_height`.
    pub async fn set_height(&self, height: u64) {
        *self.height.lock().await = height;
    }

    /// The requests observed so far, in call order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    fn spawn_body(script: Vec<ScriptedChunk>) -> BoxStream<'static, Result<Bytes, TransportError>> {
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tokio::spawn(async move {
            for chunk in script {
                match chunk {
                    ScriptedChunk::Data(bytes) => {
                        if tx.send(Ok(Bytes::from(bytes))).await.is_err() {
                            return;
                        }
                    }
                    ScriptedChunk::Pause(duration) => tokio::time::sleep(duration).await,
                    ScriptedChunk::TransientError => {
                        let _ = tx.send(Err(TransportError::SimulatedTransient)).await;
                        return;
                    }
                }
            }
        });
        Box::pin(ReceiverStream::new(rx))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_height(&self, _url: &Url) -> Result<u64, TransportError> {
        Ok(*self.height.lock().await)
    }

    async fn post_stream(&self, _url: &Url, body: &WireRequest) -> Result<StreamResponse, TransportError> {
        self.requests
            .lock()
            .await
            .push(RecordedRequest { from_block: body.from_block, to_block: body.to_block });

        let next = self.responses.lock().await.pop_front();
        match next {
            None | Some(ScriptedResponse::NoContent) => Ok(StreamResponse::NoContent),
            Some(ScriptedResponse::Status(code)) => Err(TransportError::Status(code)),
            Some(ScriptedResponse::Ok(chunks)) => Ok(StreamResponse::Ok(Self::spawn_body(chunks))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order_then_idles() {
        let transport = FakeTransport::new(
            10,
            vec![ScriptedResponse::Ok(vec![ScriptedChunk::Data(b"line\n".to_vec())]), ScriptedResponse::NoContent],
        );
        let url = Url::parse("https://portal.example/finalized-stream").unwrap();
        let body = WireRequest { from_block: 0, ..Default::default() };

        assert!(matches!(transport.post_stream(&url, &body).await.unwrap(), StreamResponse::Ok(_)));
        assert!(matches!(transport.post_stream(&url, &body).await.unwrap(), StreamResponse::NoContent));
        assert!(matches!(transport.post_stream(&url, &body).await.unwrap(), StreamResponse::NoContent));
        assert_eq!(transport.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn get_height_reflects_set_height() {
        let transport = FakeTransport::new(5, vec![]);
        let url = Url::parse("https://portal.example/finalized-stream/height").unwrap();
        assert_eq!(transport.get_height(&url).await.unwrap(), 5);
        transport.set_height(9).await;
        assert_eq!(transport.get_height(&url).await.unwrap(), 9);
    }
}
