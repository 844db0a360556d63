/// Default Dataverse Web API version segment.
pub const DEFAULT_API_VERSION: &str = "v9.2";

/// Configures API version, timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// API version path segment, e.g. `v9.2`.
    pub api_version: String,
    /// Maximum number of attempts per call, including the first one.
    ///
    /// Rate-limited (429) and failed attempts share this budget.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_backoff_ms: u64,
    /// Optional per-attempt timeout in milliseconds. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
}

impl ClientOptions {
    /// Attempt budget, never below one.
    pub(crate) fn max_attempts(&self) -> usize {
        self.max_retries.max(1)
    }

    /// Backoff before retrying after failed attempt index `attempt`:
    /// `2^attempt * retry_backoff_ms`.
    pub fn backoff_ms(&self, attempt: usize) -> u64 {
        let exp = attempt.min(16) as u32;
        let multiplier = 1u64 << exp;
        self.retry_backoff_ms.saturating_mul(multiplier)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_owned(),
            max_retries: 3,
            retry_backoff_ms: 1_000,
            timeout_ms: None,
        }
    }
}
