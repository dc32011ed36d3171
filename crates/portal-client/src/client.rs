use crate::{
    buffer::BlockBuffer,
    config::{ClientConfig, StreamOpts, DEFAULT_HEAD_REFRESH_INTERVAL},
    error::PortalError,
    head::HeadTracker,
    lines::LineSplitter,
    stream::BlockStream,
    transport::{ReqwestTransport, StreamResponse, Transport},
};
use evm_portal_types::{Block, FieldSelection, Range, RequestPayload, WireRequest};
use futures::StreamExt as _;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Client for the portal's finalized-block streaming API (spec §4.5).
///
/// Cheap to clone: the transport is shared behind an `Arc` and the config is
/// plain data.
#[derive(Debug, Clone)]
pub struct PortalClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl PortalClient {
    /// Build a client from `config`, constructing a [`ReqwestTransport`] from
    /// `config.client` (or a fresh `reqwest::Client` if none was given).
    pub fn new(config: ClientConfig) -> Self {
        let client = config.client.clone().unwrap_or_default();
        let transport = Arc::new(ReqwestTransport::new(client, config.request.clone()));
        Self::with_transport(config, transport)
    }

    /// Build a client over an arbitrary [`Transport`] implementation, e.g.
    /// the fake transport from `evm-portal-test-utils`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// The portal's current finalized height.
    #[instrument(skip(self))]
    pub async fn get_finalized_height(&self) -> Result<u64, PortalError> {
        let url = self.config.url.join("finalized-stream/height")?;
        Ok(self.transport.get_height(&url).await?)
    }

    /// Drive a single range segment to completion and return its blocks as
    /// one `Vec`, ignoring the streaming/backpressure machinery (spec §4.5,
    /// `get_finalized_batch`). Implemented as a stream with
    /// `stop_on_head = true`, fully drained.
    #[instrument(skip(self, payload, fields), fields(from = range.from, to = ?range.to))]
    pub async fn get_finalized_batch(
        &self,
        range: Range,
        payload: RequestPayload,
        fields: FieldSelection,
    ) -> Result<Vec<Block>, PortalError> {
        let opts = StreamOpts { stop_on_head: true, ..Default::default() };
        let mut stream = self.get_finalized_stream(range, payload, fields, opts);
        let mut blocks = Vec::new();
        while let Some(batch) = stream.next().await {
            blocks.extend(batch?.blocks);
        }
        Ok(blocks)
    }

    /// Start streaming one disjoint range segment (as produced by
    /// [`evm_portal_types::QueryBuilder::build`]) against the portal,
    /// spawning an ingest task that feeds a block buffer and returning a
    /// pull-based [`BlockStream`] in front of it (spec §4.5).
    #[instrument(skip(self, payload, fields), fields(from = range.from, to = ?range.to))]
    pub fn get_finalized_stream(
        &self,
        range: Range,
        payload: RequestPayload,
        fields: FieldSelection,
        opts: StreamOpts,
    ) -> BlockStream {
        let min_bytes = opts.min_bytes.unwrap_or(self.config.min_bytes);
        let max_bytes = opts.max_bytes.unwrap_or(self.config.max_bytes).max(min_bytes);
        let max_idle_time = opts.max_idle_time.unwrap_or(self.config.max_idle_time);
        let max_wait_time = opts.max_wait_time.unwrap_or(self.config.max_wait_time);

        let buffer = Arc::new(BlockBuffer::new(min_bytes, max_bytes));
        let cancel = CancellationToken::new();

        let height_url = self
            .config
            .url
            .join("finalized-stream/height")
            .expect("joining a fixed relative path onto a valid base URL cannot fail");
        let head =
            Arc::new(HeadTracker::new(self.transport.clone(), height_url, DEFAULT_HEAD_REFRESH_INTERVAL));

        let stream_url = self
            .config
            .url
            .join("finalized-stream")
            .expect("joining a fixed relative path onto a valid base URL cannot fail");

        let ingest = Ingest {
            transport: self.transport.clone(),
            url: stream_url,
            buffer: buffer.clone(),
            cancel: cancel.clone(),
            range,
            fields: fields.with_always_selected(),
            payload,
            stop_on_head: opts.stop_on_head,
            max_idle_time,
            max_wait_time,
            head_poll_interval: self.config.head_poll_interval,
        };

        let handle = tokio::spawn(ingest.run());
        BlockStream::new(buffer, head, cancel, handle)
    }
}

/// The ingest actor: one per [`BlockStream`], owning the HTTP/retry/resume
/// loop described in spec §4.5.
struct Ingest {
    transport: Arc<dyn Transport>,
    url: reqwest::Url,
    buffer: Arc<BlockBuffer>,
    cancel: CancellationToken,
    range: Range,
    fields: FieldSelection,
    payload: RequestPayload,
    stop_on_head: bool,
    max_idle_time: Duration,
    max_wait_time: Duration,
    head_poll_interval: Duration,
}

impl Ingest {
    async fn run(self) {
        match self.drive().await {
            Ok(()) => {}
            Err(e) if self.cancel.is_cancelled() => {
                debug!(error = %e, "ingest loop ended by cancellation while an error was in flight");
            }
            Err(e) => {
                error!(error = %e, "finalized stream terminated with a fatal error");
                self.buffer.fail(e);
                return;
            }
        }
        self.buffer.close();
    }

    fn request_body(&self, from_block: u64) -> WireRequest {
        WireRequest {
            kind: Default::default(),
            from_block,
            to_block: self.range.to,
            fields: self.fields.clone(),
            logs: self.payload.logs.clone(),
            transactions: self.payload.transactions.clone(),
            traces: self.payload.traces.clone(),
            state_diffs: self.payload.state_diffs.clone(),
            include_all_blocks: self.payload.include_all_blocks,
        }
    }

    #[instrument(skip_all, fields(url = %self.url, from = self.range.from, to = ?self.range.to))]
    async fn drive(&self) -> Result<(), PortalError> {
        let mut from_block = self.range.from;
        let to_block = self.range.to.unwrap_or(u64::MAX);
        let mut last_seen: Option<u64> = None;

        'requests: while from_block <= to_block {
            if self.cancel.is_cancelled() {
                break;
            }

            let body = self.request_body(from_block);
            let response = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break 'requests,
                res = self.transport.post_stream(&self.url, &body) => res?,
            };

            let mut body_stream = match response {
                StreamResponse::NoContent => {
                    debug!(from_block, "no data at head yet");
                    if self.stop_on_head {
                        break;
                    }
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break 'requests,
                        _ = tokio::time::sleep(self.head_poll_interval) => {}
                    }
                    continue;
                }
                StreamResponse::Ok(body_stream) => body_stream,
            };

            let mut splitter = LineSplitter::new();
            let mut idle_deadline = tokio::time::Instant::now() + self.max_idle_time;
            let mut truncated = false;

            loop {
                let wait_deadline = if self.buffer.is_empty() {
                    tokio::time::Instant::now() + self.max_wait_time
                } else {
                    self.buffer.last_handoff() + self.max_wait_time
                };

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break 'requests,
                    chunk = body_stream.next() => {
                        match chunk {
                            Some(Ok(bytes)) => {
                                idle_deadline = tokio::time::Instant::now() + self.max_idle_time;
                                let lines = splitter.push(&bytes)?;
                                for line in lines {
                                    if line.is_empty() {
                                        continue;
                                    }
                                    let block: Block = serde_json::from_str(&line)?;
                                    let number = block.number();
                                    if let Some(last) = last_seen {
                                        if number <= last {
                                            return Err(PortalError::OutOfOrder { expected: last + 1, got: number });
                                        }
                                    }
                                    last_seen = Some(number);
                                    let line_len = line.len() as u64 + 1;
                                    if self.buffer.append(block, line_len) {
                                        debug!(bytes = self.buffer.bytes(), "min_bytes crossed; buffer ready");
                                    }
                                    from_block = number + 1;
                                }
                                if self.buffer.over_high_water() {
                                    debug!(bytes = self.buffer.bytes(), "backpressure engaged");
                                    self.buffer.force_ready();
                                    tokio::select! {
                                        biased;
                                        _ = self.cancel.cancelled() => break 'requests,
                                        _ = self.buffer.wait_for_space() => {
                                            debug!("backpressure released");
                                        }
                                    }
                                }
                            }
                            Some(Err(e)) if e.is_transient() => {
                                warn!(error = %e, from_block, "transient body-read error; resuming");
                                truncated = true;
                                break;
                            }
                            Some(Err(e)) => return Err(e.into()),
                            None => {
                                debug!(from_block, "response body ended");
                                if let Some(line) = splitter.finish()? {
                                    if !line.is_empty() {
                                        let block: Block = serde_json::from_str(&line)?;
                                        let number = block.number();
                                        if let Some(last) = last_seen {
                                            if number <= last {
                                                return Err(PortalError::OutOfOrder { expected: last + 1, got: number });
                                            }
                                        }
                                        last_seen = Some(number);
                                        let line_len = line.len() as u64;
                                        if self.buffer.append(block, line_len) {
                                            debug!(bytes = self.buffer.bytes(), "min_bytes crossed; buffer ready");
                                        }
                                        from_block = number + 1;
                                    }
                                }
                                break;
                            }
                        }
                    }
                    _ = tokio::time::sleep_until(idle_deadline) => {
                        self.buffer.force_ready();
                        idle_deadline = tokio::time::Instant::now() + self.max_idle_time;
                    }
                    _ = tokio::time::sleep_until(wait_deadline) => {
                        self.buffer.force_ready();
                    }
                }
            }

            self.buffer.force_ready();
            if truncated {
                info!(from_block, "reissuing request after truncation");
            }
        }

        Ok(())
    }
}
