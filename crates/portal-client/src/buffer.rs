use crate::error::PortalError;
use evm_portal_types::Block;
use std::sync::Mutex;
use tokio::{sync::Notify, time::Instant};

/// The contents handed off to the consumer in one pull (spec §3, "Block
/// buffer entry").
#[derive(Debug, Default)]
pub(crate) struct BufferEntry {
    pub(crate) blocks: Vec<Block>,
    pub(crate) bytes: u64,
}

#[derive(Debug)]
enum State {
    Filling,
    Ready,
    Closed,
    Failed(PortalError),
}

#[derive(Debug)]
struct Shared {
    entry: BufferEntry,
    state: State,
    last_handoff: Instant,
}

/// A bounded single-producer/single-consumer rendezvous with three readiness
/// triggers and one hard backpressure threshold (spec §4.4).
///
/// Handoff is modeled as a small state machine (`Filling`/`Ready`/`Closed`/
/// `Failed`) rather than ad-hoc flags, per the re-architecture note in §9.
#[derive(Debug)]
pub(crate) struct BlockBuffer {
    shared: Mutex<Shared>,
    ready: Notify,
    space: Notify,
    min_bytes: u64,
    max_bytes: u64,
}

impl BlockBuffer {
    /// A new, empty buffer. `max_bytes` is raised to `min_bytes` if given
    /// lower, matching the "≥ min_bytes" invariant in §4.4.
    pub(crate) fn new(min_bytes: u64, max_bytes: u64) -> Self {
        Self {
            shared: Mutex::new(Shared {
                entry: BufferEntry::default(),
                state: State::Filling,
                last_handoff: Instant::now(),
            }),
            ready: Notify::new(),
            space: Notify::new(),
            min_bytes,
            max_bytes: max_bytes.max(min_bytes),
        }
    }

    /// Append a decoded block plus the on-wire length of the line that
    /// produced it. Returns `true` if this append crossed `min_bytes`
    /// (readiness trigger 1).
    pub(crate) fn append(&self, block: Block, line_len: u64) -> bool {
        let mut shared = self.shared.lock().unwrap();
        shared.entry.blocks.push(block);
        shared.entry.bytes += line_len;
        let crossed = shared.entry.bytes >= self.min_bytes;
        if crossed && matches!(shared.state, State::Filling) {
            shared.state = State::Ready;
        }
        drop(shared);
        if crossed {
            self.ready.notify_one();
        }
        crossed
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.shared.lock().unwrap().entry.bytes
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.shared.lock().unwrap().entry.blocks.is_empty()
    }

    /// `true` once backpressure (trigger beyond `max_bytes`) must be applied.
    pub(crate) fn over_high_water(&self) -> bool {
        self.bytes() >= self.max_bytes
    }

    /// When the last handoff to the consumer completed (or buffer creation,
    /// if none yet) — the anchor for the wait timer.
    pub(crate) fn last_handoff(&self) -> Instant {
        self.shared.lock().unwrap().last_handoff
    }

    /// Force a handoff regardless of `min_bytes` (idle timer, wait timer, or
    /// natural end of the HTTP response — readiness triggers 2-4). A no-op
    /// if the buffer is currently empty.
    pub(crate) fn force_ready(&self) {
        let mut shared = self.shared.lock().unwrap();
        if shared.entry.blocks.is_empty() {
            return;
        }
        if matches!(shared.state, State::Filling) {
            shared.state = State::Ready;
        }
        drop(shared);
        self.ready.notify_one();
    }

    /// Park the producer until the buffer has been taken by the consumer.
    pub(crate) async fn wait_for_space(&self) {
        loop {
            if self.bytes() < self.max_bytes {
                return;
            }
            self.space.notified().await;
        }
    }

    /// Pull the entire buffer contents, resetting it to empty/`Filling` and
    /// releasing anything parked on backpressure. Returns `None` once the
    /// buffer has been closed and drained; a stored producer failure is
    /// returned exactly once, after which the buffer behaves as closed.
    pub(crate) async fn take(&self) -> Option<Result<BufferEntry, PortalError>> {
        loop {
            let settled = {
                let shared = self.shared.lock().unwrap();
                matches!(shared.state, State::Ready | State::Closed | State::Failed(_))
            };
            if settled {
                let mut shared = self.shared.lock().unwrap();
                let state = std::mem::replace(&mut shared.state, State::Filling);
                return match state {
                    State::Ready => {
                        let entry = std::mem::take(&mut shared.entry);
                        shared.last_handoff = Instant::now();
                        drop(shared);
                        self.space.notify_one();
                        Some(Ok(entry))
                    }
                    State::Closed => {
                        shared.state = State::Closed;
                        None
                    }
                    State::Failed(err) => {
                        shared.state = State::Closed;
                        Some(Err(err))
                    }
                    State::Filling => unreachable!("checked settled above"),
                };
            }
            self.ready.notified().await;
        }
    }

    /// Close the buffer. Idempotent; does not overwrite a stored failure.
    pub(crate) fn close(&self) {
        let mut shared = self.shared.lock().unwrap();
        if !matches!(shared.state, State::Failed(_)) {
            shared.state = State::Closed;
        }
        drop(shared);
        self.ready.notify_one();
        self.space.notify_one();
    }

    /// Store a producer failure, to be delivered on the next `take`.
    pub(crate) fn fail(&self, err: PortalError) {
        let mut shared = self.shared.lock().unwrap();
        shared.state = State::Failed(err);
        drop(shared);
        self.ready.notify_one();
        self.space.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evm_portal_types::Header;
    use serde_json::Map;
    use std::{sync::Arc, time::Duration};

    fn block(n: u64) -> Block {
        Block {
            header: Header { number: n, hash: format!("0x{n:x}"), parent_hash: "0x0".into(), extra: Map::new() },
            transactions: None,
            logs: None,
            traces: None,
            state_diffs: None,
        }
    }

    #[tokio::test]
    async fn min_bytes_triggers_without_waiting_for_more_chunks() {
        let buffer = BlockBuffer::new(20, 100);
        assert!(!buffer.append(block(1), 10));
        assert!(buffer.append(block(2), 10));
        let entry = buffer.take().await.unwrap().unwrap();
        assert_eq!(entry.blocks.len(), 2);
        assert_eq!(entry.bytes, 20);
    }

    #[tokio::test]
    async fn force_ready_is_a_noop_when_empty() {
        let buffer = BlockBuffer::new(1_000, 1_000);
        buffer.force_ready();
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn backpressure_releases_after_a_take() {
        let buffer = Arc::new(BlockBuffer::new(1_000, 50));
        for i in 0..6 {
            buffer.append(block(i), 10);
        }
        assert!(buffer.over_high_water());

        let waiter = tokio::spawn({
            let buffer = buffer.clone();
            async move { buffer.wait_for_space().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        buffer.force_ready();
        let entry = buffer.take().await.unwrap().unwrap();
        assert_eq!(entry.blocks.len(), 6);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn close_unblocks_a_pending_take() {
        let buffer = Arc::new(BlockBuffer::new(1_000, 1_000));
        let taker = tokio::spawn({
            let buffer = buffer.clone();
            async move { buffer.take().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        buffer.close();
        assert!(taker.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn a_failure_is_delivered_once_then_the_buffer_closes() {
        let buffer = BlockBuffer::new(1_000, 1_000);
        buffer.fail(PortalError::Config("boom".into()));
        assert!(buffer.take().await.unwrap().is_err());
        assert!(buffer.take().await.is_none());
    }

    #[tokio::test]
    async fn blocks_are_delivered_in_append_order() {
        let buffer = BlockBuffer::new(1, 1_000);
        buffer.append(block(10), 5);
        buffer.append(block(11), 5);
        buffer.append(block(12), 5);
        let entry = buffer.take().await.unwrap().unwrap();
        let numbers: Vec<u64> = entry.blocks.iter().map(Block::number).collect();
        assert_eq!(numbers, vec![10, 11, 12]);
    }
}
