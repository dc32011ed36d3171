use crate::lines::LineSplitterError;
use thiserror::Error;

/// Errors from the [`Transport`](crate::Transport) seam: connection-level
/// failures and the server's HTTP-level responses (spec §4.7, §7).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying `reqwest` call failed (connect, send, or body read).
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    /// The server responded with a status other than `200`/`204`.
    #[error("unexpected status code {0}")]
    Status(u16),
    /// The `finalized-stream/height` body was not a plain decimal integer.
    #[error("invalid finalized height body: {0:?}")]
    InvalidHeight(String),
    /// A simulated transient failure, for transports that cannot otherwise
    /// construct a `reqwest::Error` with `is_timeout() == true` (fakes used
    /// in tests).
    #[error("simulated transient transport failure")]
    SimulatedTransient,
}

impl TransportError {
    /// A body-read or connect timeout, recoverable by resuming the request
    /// (spec §7, "Transport transient").
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout()) || matches!(self, Self::SimulatedTransient)
    }

    /// A connect-level failure, retried locally by [`ReqwestTransport`](crate::ReqwestTransport)
    /// before it ever reaches the streaming client.
    pub(crate) fn is_connect_level(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_request())
    }
}

/// Errors surfaced by the [`PortalClient`](crate::PortalClient) and the
/// streams it produces.
#[derive(Debug, Error)]
pub enum PortalError {
    /// A fatal transport error: non-2xx/204 status, connect failure, or an
    /// HTTP-level read error that was not recognized as transient.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A response line (or the height endpoint body) could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The server emitted a block number that did not strictly increase past
    /// the last one delivered (spec §7, §9 open question).
    #[error("out-of-order block: expected at least {expected}, got {got}")]
    OutOfOrder {
        /// The smallest block number that would have been acceptable.
        expected: u64,
        /// The block number the server actually sent.
        got: u64,
    },
    /// The client or stream was misconfigured (bad URL, bad threshold).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<LineSplitterError> for PortalError {
    fn from(e: LineSplitterError) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

impl From<url::ParseError> for PortalError {
    fn from(e: url::ParseError) -> Self {
        Self::Config(e.to_string())
    }
}
