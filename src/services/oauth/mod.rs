//! Outbound identity provider clients
//!
//! Each provider sits behind a trait so flows can be exercised with fakes.

pub mod github;
pub mod wechat;

pub use github::{GithubApi, GithubClient, GithubEmail, GithubProfile};
pub use wechat::{WechatAccessToken, WechatApi, WechatClient, WechatUserInfo};

use std::time::Duration;

use crate::errors::InternalError;
use crate::errors::internal::OAuthError;

/// Timeout for every call to an identity provider
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client(provider: &str) -> Result<reqwest::Client, InternalError> {
    reqwest::Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .user_agent(concat!("healthtrack-backend/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| OAuthError::upstream(provider, format!("failed to build HTTP client: {}", e)).into())
}

/// Build `base?k=v&...` with every value percent-encoded
pub(crate) fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_query_encodes_values() {
        let url = with_query(
            "https://example.com/cb",
            &[("redirect_uri", "http://localhost:3000/a b"), ("scope", "user:email")],
        );
        assert_eq!(
            url,
            "https://example.com/cb?redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fa%20b&scope=user%3Aemail"
        );
    }
}
