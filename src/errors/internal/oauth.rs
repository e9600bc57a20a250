use thiserror::Error;

#[derive(Error, Debug)]
pub enum OAuthError {
    /// State is unknown, expired or already consumed
    #[error("Invalid or expired OAuth state")]
    InvalidState,

    #[error("Missing code or state")]
    MissingCodeOrState,

    #[error("No pending {provider} registration")]
    PendingRegistrationMissing { provider: String },

    /// Provider call failed; details are for logs only
    #[error("{provider} request failed: {message}")]
    Upstream { provider: String, message: String },

    #[error("{provider} login is not configured")]
    NotConfigured { provider: String },
}

impl OAuthError {
    pub fn upstream(provider: &str, message: impl Into<String>) -> Self {
        OAuthError::Upstream {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}
