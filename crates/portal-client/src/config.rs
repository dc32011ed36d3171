use crate::error::PortalError;
use reqwest::header::HeaderMap;
use std::time::Duration;
use url::Url;

/// Low-water mark default: 40 MiB (spec §4.4).
pub const DEFAULT_MIN_BYTES: u64 = 40 * 1024 * 1024;
/// Idle-timer default: 300ms between chunks.
pub const DEFAULT_MAX_IDLE_TIME: Duration = Duration::from_millis(300);
/// Wait-timer default: 5s since the last handoff.
pub const DEFAULT_MAX_WAIT_TIME: Duration = Duration::from_millis(5000);
/// Default delay between `204` retries at the chain head.
pub const DEFAULT_HEAD_POLL_INTERVAL: Duration = Duration::from_millis(5000);
/// Minimum interval between polls of `finalized-stream/height` used to stamp
/// batches (spec §4.5, "approximately 10-20s").
pub const DEFAULT_HEAD_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Retry schedule for connect-level transport failures (never for a fatal
/// HTTP status, which is a semantic error rather than a transient one).
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries before the failure is surfaced.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent attempt.
    pub base_delay: Duration,
    /// Ceiling on the (exponentially growing) retry delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(200), max_delay: Duration::from_secs(5) }
    }
}

/// Per-request defaults applied by [`ReqwestTransport`](crate::ReqwestTransport).
#[derive(Debug, Clone, Default)]
pub struct RequestDefaults {
    /// Headers sent with every request.
    pub headers: HeaderMap,
    /// Retry schedule for connect-level failures.
    pub retry: RetryConfig,
    /// Per-request timeout, if any.
    pub timeout: Option<Duration>,
}

/// Configuration for constructing a [`PortalClient`](crate::PortalClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the portal service.
    pub url: Url,
    /// An existing `reqwest::Client` to reuse, instead of constructing one.
    pub client: Option<reqwest::Client>,
    /// Low-water mark (bytes) that triggers an immediate handoff.
    pub min_bytes: u64,
    /// High-water mark (bytes) past which the producer applies backpressure.
    pub max_bytes: u64,
    /// Idle timer: force a handoff if no chunk arrives within this long.
    pub max_idle_time: Duration,
    /// Wait timer: force a handoff if this long has passed since the last one.
    pub max_wait_time: Duration,
    /// Delay between `204` retries when the stream has caught up to the head.
    pub head_poll_interval: Duration,
    /// Defaults applied to every outgoing HTTP request.
    pub request: RequestDefaults,
}

impl ClientConfig {
    /// A config with the documented defaults for the given base URL.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            client: None,
            min_bytes: DEFAULT_MIN_BYTES,
            max_bytes: DEFAULT_MIN_BYTES,
            max_idle_time: DEFAULT_MAX_IDLE_TIME,
            max_wait_time: DEFAULT_MAX_WAIT_TIME,
            head_poll_interval: DEFAULT_HEAD_POLL_INTERVAL,
            request: RequestDefaults::default(),
        }
    }

    /// Build a config from environment variables, following the layered
    /// env/builder pattern: `PORTAL_URL` (required), `PORTAL_MIN_BYTES`,
    /// `PORTAL_MAX_BYTES`, `PORTAL_MAX_IDLE_TIME_MS`, `PORTAL_MAX_WAIT_TIME_MS`,
    /// `PORTAL_HEAD_POLL_INTERVAL_MS` (all optional).
    pub fn from_env() -> Result<Self, PortalError> {
        let url_str =
            std::env::var("PORTAL_URL").map_err(|_| PortalError::Config("PORTAL_URL not set".into()))?;
        let url = Url::parse(&url_str)?;
        let mut config = Self::new(url);

        if let Some(v) = env_u64("PORTAL_MIN_BYTES")? {
            config.min_bytes = v;
            config.max_bytes = v;
        }
        if let Some(v) = env_u64("PORTAL_MAX_BYTES")? {
            config.max_bytes = v;
        }
        if let Some(v) = env_u64("PORTAL_MAX_IDLE_TIME_MS")? {
            config.max_idle_time = Duration::from_millis(v);
        }
        if let Some(v) = env_u64("PORTAL_MAX_WAIT_TIME_MS")? {
            config.max_wait_time = Duration::from_millis(v);
        }
        if let Some(v) = env_u64("PORTAL_HEAD_POLL_INTERVAL_MS")? {
            config.head_poll_interval = Duration::from_millis(v);
        }

        config.max_bytes = config.max_bytes.max(config.min_bytes);
        Ok(config)
    }
}

fn env_u64(name: &'static str) -> Result<Option<u64>, PortalError> {
    match std::env::var(name) {
        Ok(v) => v
            .parse()
            .map(Some)
            .map_err(|_| PortalError::Config(format!("{name} must be a non-negative integer"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(PortalError::Config(format!("{name}: {e}"))),
    }
}

/// Per-stream overrides of the client's size/time thresholds, plus whether
/// the stream should stop instead of polling once it reaches the head.
#[derive(Debug, Clone, Default)]
pub struct StreamOpts {
    /// Override of [`ClientConfig::min_bytes`].
    pub min_bytes: Option<u64>,
    /// Override of [`ClientConfig::max_bytes`].
    pub max_bytes: Option<u64>,
    /// Override of [`ClientConfig::max_idle_time`].
    pub max_idle_time: Option<Duration>,
    /// Override of [`ClientConfig::max_wait_time`].
    pub max_wait_time: Option<Duration>,
    /// Terminate (rather than head-poll) once the server returns `204`.
    pub stop_on_head: bool,
}
