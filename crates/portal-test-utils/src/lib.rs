//! Fake [`Transport`](evm_portal_client::Transport) and scripted fixtures for
//! testing `evm-portal-client` without a live portal.

mod fake;
pub use fake::{FakeTransport, RecordedRequest, ScriptedChunk, ScriptedResponse};

pub mod fixtures;

/// Initialize tracing for local debugging of a test run.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .try_init()
        .ok();
}
