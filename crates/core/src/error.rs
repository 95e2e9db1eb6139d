use thiserror::Error;

/// Failure of a backend request issued on behalf of the UI.
///
/// Every variant is recoverable: the panel that issued the request shows an
/// inline "unavailable" state and the next user-triggered fetch retries.
/// `Display` is the short reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Timeout")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("Network error")]
    Network(String),
    #[error("Invalid response")]
    Decode(String),
}

impl FetchError {
    /// Underlying detail for logs; the `Display` form stays user-facing.
    pub fn detail(&self) -> String {
        match self {
            FetchError::Timeout => "request timed out".to_string(),
            FetchError::Status(code) => format!("unexpected status {code}"),
            FetchError::Network(msg) | FetchError::Decode(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_short_reason() {
        assert_eq!(FetchError::Timeout.to_string(), "Timeout");
        assert_eq!(FetchError::Status(503).to_string(), "HTTP 503");
        assert_eq!(
            FetchError::Decode("eof at line 1".into()).to_string(),
            "Invalid response"
        );
        assert_eq!(FetchError::Network("refused".into()).detail(), "refused");
    }
}
