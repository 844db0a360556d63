use serde_json::Value as JsonValue;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum DataverseError {
    /// The token provider had no bearer token. No request was sent.
    #[error("authentication token is missing; sign in again")]
    Authentication,
    /// Non-success HTTP status code with the best-effort parsed error body.
    ///
    /// `body` is an empty JSON object when the response body was not JSON.
    #[error("api error {status} {status_text}")]
    Api {
        status: u16,
        status_text: String,
        body: JsonValue,
    },
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// A successful response whose body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// Invalid caller-supplied configuration (base URL, header value).
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DataverseError {
    /// HTTP status code for [`DataverseError::Api`] errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// `true` when the API rejected the bearer token (HTTP 401).
    ///
    /// View layers use this to send the user back through sign-in instead of
    /// showing a generic failure.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Authentication) || self.status() == Some(401)
    }

    /// `true` when the retry budget ran out while the API kept answering 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Whether the request loop treats this error as transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Transport(_) | Self::Decode(_)
        )
    }

    /// Upstream error message from the OData error envelope, if present.
    ///
    /// Dataverse reports failures as `{"error": {"code": "...", "message": "..."}}`.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. } => body
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(JsonValue::as_str),
            _ => None,
        }
    }
}
