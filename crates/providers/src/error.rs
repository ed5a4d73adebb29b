/// Errors from metadata-provider HTTP calls.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the provider.
    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Could not obtain or refresh an access token.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Response body did not match the expected shape.
    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Whether a retry in a later selection round could plausibly
    /// succeed. Timeouts, connection failures, rate limits, and
    /// server errors are transient; auth and decode failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Auth(_) | ProviderError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_rate_limits_are_transient() {
        assert!(ProviderError::Status { status: 500, body: String::new() }.is_transient());
        assert!(ProviderError::Status { status: 503, body: String::new() }.is_transient());
        assert!(ProviderError::Status { status: 429, body: String::new() }.is_transient());
    }

    #[test]
    fn client_errors_are_not_transient() {
        assert!(!ProviderError::Status { status: 400, body: String::new() }.is_transient());
        assert!(!ProviderError::Status { status: 404, body: String::new() }.is_transient());
        assert!(!ProviderError::Auth("bad secret".into()).is_transient());
        assert!(!ProviderError::Decode("truncated".into()).is_transient());
    }
}
