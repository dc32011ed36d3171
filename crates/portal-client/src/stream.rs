use crate::{buffer::BlockBuffer, error::PortalError, head::HeadTracker};
use evm_portal_types::BlockBatch;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A pull-based stream of [`BlockBatch`]es backed by a [`BlockBuffer`] and
/// an ingest task (spec §4.5, §9 "Stream object with pull/cancel").
///
/// Dropping a `BlockStream` cancels the ingest task if it hasn't finished,
/// so a caller that stops polling doesn't leak an HTTP connection.
#[derive(Debug)]
pub struct BlockStream {
    buffer: Arc<BlockBuffer>,
    head: Arc<HeadTracker>,
    cancel: CancellationToken,
    ingest: Option<JoinHandle<()>>,
}

impl BlockStream {
    pub(crate) fn new(
        buffer: Arc<BlockBuffer>,
        head: Arc<HeadTracker>,
        cancel: CancellationToken,
        ingest: JoinHandle<()>,
    ) -> Self {
        Self { buffer, head, cancel, ingest: Some(ingest) }
    }

    /// Pull the next batch. Returns `None` once the query is exhausted, the
    /// stream reached the head with `stop_on_head`, or it was cancelled.
    /// A fatal error is returned exactly once, after which the stream ends.
    pub async fn next(&mut self) -> Option<Result<BlockBatch, PortalError>> {
        match self.buffer.take().await {
            None => None,
            Some(Err(e)) => Some(Err(e)),
            Some(Ok(entry)) => {
                let finalized_head = self.head.current().await;
                Some(Ok(BlockBatch { finalized_head, blocks: entry.blocks }))
            }
        }
    }

    /// Request cancellation. Idempotent; at most one further batch (one
    /// already prepared) is delivered before the stream ends (spec §4.5,
    /// §8 invariant 4).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for BlockStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.ingest.take() {
            handle.abort();
        }
    }
}
