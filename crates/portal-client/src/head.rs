use crate::transport::Transport;
use evm_portal_types::FinalizedHead;
use reqwest::Url;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};
use tracing::warn;

struct State {
    head: FinalizedHead,
    last_polled: Option<Instant>,
}

/// Throttled poller for `finalized-stream/height`, shared by one
/// [`BlockStream`](crate::BlockStream) to stamp every delivered batch (spec
/// §4.5 "Finalized head reporting").
///
/// `hash` is always `None` today (the portal doesn't return it yet); `number`
/// is monotonically non-decreasing across calls, per §8 invariant 2, even if
/// a poll fails or briefly returns a smaller value than already observed.
#[derive(Debug)]
pub(crate) struct HeadTracker {
    transport: Arc<dyn Transport>,
    url: Url,
    min_interval: Duration,
    state: Mutex<State>,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State").field("head", &self.head).field("last_polled", &self.last_polled).finish()
    }
}

impl HeadTracker {
    pub(crate) fn new(transport: Arc<dyn Transport>, url: Url, min_interval: Duration) -> Self {
        Self {
            transport,
            url,
            min_interval,
            state: Mutex::new(State { head: FinalizedHead::new(0), last_polled: None }),
        }
    }

    /// The current finalized head, refreshing it from the portal if the
    /// throttle interval has elapsed since the last poll.
    pub(crate) async fn current(&self) -> FinalizedHead {
        let mut state = self.state.lock().await;
        let due = state.last_polled.map_or(true, |t| t.elapsed() >= self.min_interval);
        if due {
            match self.transport.get_height(&self.url).await {
                Ok(number) => {
                    state.head.number = state.head.number.max(number);
                }
                Err(e) => {
                    warn!(error = %e, "failed to refresh finalized head; keeping last known value");
                }
            }
            state.last_polled = Some(Instant::now());
        }
        state.head
    }
}
