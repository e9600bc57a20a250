use serde::{Deserialize, Serialize};

use crate::types::db::user;

/// Third-party identity providers that can be linked to a local account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Github,
    Wechat,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Github => "github",
            Provider::Wechat => "wechat",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity asserted by a provider after a successful code exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub provider: Provider,
    /// github user id or wechat openid
    pub provider_id: String,
    /// github login; None for wechat
    pub provider_username: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Fields needed to create a brand new local account for a provider identity
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
}

/// How a provider identity mapped onto a local account
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Account already carried this provider id
    Existing(user::Model),
    /// Provider id was attached to an account found by email
    Linked(user::Model),
    /// A new account was created
    Created(user::Model),
}

impl Resolution {
    pub fn user(&self) -> &user::Model {
        match self {
            Resolution::Existing(u) | Resolution::Linked(u) | Resolution::Created(u) => u,
        }
    }

    pub fn into_user(self) -> user::Model {
        match self {
            Resolution::Existing(u) | Resolution::Linked(u) | Resolution::Created(u) => u,
        }
    }
}

/// GitHub identity waiting for the user to supply an email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingGithubRegistration {
    pub github_id: String,
    pub github_username: String,
    pub name: Option<String>,
}

/// Payload stored under a WeChat state key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum WechatState {
    /// Issued by the login endpoint, waiting for the provider callback
    Issued,
    /// Callback resolved an openid with no local account; waiting for bind
    PendingBind {
        openid: String,
        nickname: Option<String>,
    },
}
