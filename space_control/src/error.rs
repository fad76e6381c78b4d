// Error taxonomy of the control server.
//
// Every handler returns `Result<_, ControlError>`; the request loop turns an
// error into a `{"error": ...}` body with the status from `status()`.
// Validation errors are the caller's fault and have no side effects; the
// rest are faults on our side. `Bind` only comes out of `start_control`.

use space_protocol::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Out-of-range or missing request parameter.
    #[error("{0}")]
    Validation(String),
    #[error("no such endpoint: {0}")]
    NotFound(String),
    /// Query string that cannot be decoded (bad percent-encoding, non-UTF-8).
    #[error("malformed query: {0}")]
    MalformedQuery(String),
    #[error("universe lock poisoned")]
    LockPoisoned,
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}

impl ControlError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::MalformedQuery(_) | Self::LockPoisoned | Self::Serialize(_) | Self::Bind { .. } => {
                500
            }
        }
    }

    /// JSON body for this error. Falls back to a fixed body if the message
    /// somehow fails to serialize.
    pub fn to_body(&self) -> String {
        serde_json::to_string(&ErrorResponse {
            error: self.to_string(),
        })
        .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string())
    }
}
