use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GithubSettings;
use crate::errors::InternalError;
use crate::errors::internal::OAuthError;
use crate::services::oauth::{http_client, with_query};

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_BASE: &str = "https://api.github.com";

/// Subset of `GET /user`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GithubProfile {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// One entry of `GET /user/emails`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GithubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Exchange an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<String, InternalError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<GithubProfile, InternalError>;

    async fn fetch_emails(&self, access_token: &str) -> Result<Vec<GithubEmail>, InternalError>;

    /// Browser redirect target that starts the flow
    fn authorize_url(&self, state: &str) -> String;
}

/// Primary+verified first, then the first verified address
pub fn select_email(emails: &[GithubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| e.email.clone())
}

/// GitHub OAuth app client
pub struct GithubClient {
    settings: GithubSettings,
    http: reqwest::Client,
}

impl GithubClient {
    pub fn new(settings: GithubSettings) -> Result<Self, InternalError> {
        Ok(Self {
            settings,
            http: http_client("github")?,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, access_token: &str) -> Result<T, InternalError> {
        let response = self
            .http
            .get(format!("{}{}", API_BASE, path))
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| OAuthError::upstream("github", format!("GET {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            return Err(OAuthError::upstream("github", format!("GET {} returned {}", path, response.status())).into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| OAuthError::upstream("github", format!("invalid {} payload: {}", path, e)).into())
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn exchange_code(&self, code: &str) -> Result<String, InternalError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::upstream("github", format!("token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OAuthError::upstream("github", format!("token exchange returned {}", response.status())).into());
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::upstream("github", format!("invalid token payload: {}", e)))?;

        // GitHub reports a bad code as 200 with an `error` field
        match (body.access_token, body.error) {
            (Some(token), None) if !token.is_empty() => Ok(token),
            (_, Some(error)) => Err(OAuthError::upstream("github", format!("token exchange rejected: {}", error)).into()),
            _ => Err(OAuthError::upstream("github", "token exchange returned no access_token").into()),
        }
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<GithubProfile, InternalError> {
        self.get_json("/user", access_token).await
    }

    async fn fetch_emails(&self, access_token: &str) -> Result<Vec<GithubEmail>, InternalError> {
        self.get_json("/user/emails", access_token).await
    }

    fn authorize_url(&self, state: &str) -> String {
        with_query(
            AUTHORIZE_URL,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("scope", "user:email"),
                ("state", state),
            ],
        )
    }
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("client_id", &self.settings.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
