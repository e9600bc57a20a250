use poem_openapi::{ApiResponse, Object};
use poem_openapi::payload::Json;

use crate::types::dto::auth::TokenResponse;

/// Request model for finishing a GitHub registration that lacked an email
///
/// Fields are optional on the wire so an absent key reaches the service
/// checks and gets the JSON error body.
#[derive(Object, Debug)]
pub struct GithubCompleteRequest {
    /// Token from the complete-registration redirect
    pub pending_token: Option<String>,
    pub email: Option<String>,
}

/// WeChat QR login parameters
#[derive(Object, Debug)]
pub struct WechatLoginResponse {
    /// URL the client renders as a QR code
    pub qrcode_url: String,
    pub state: String,
}

#[derive(Object, Debug)]
pub struct WechatCallbackRequest {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Outcome of a WeChat callback
///
/// `status` is `existing_user` (tokens set) or `new_user` (state set; call
/// bind with it).
#[derive(Object, Debug)]
pub struct WechatCallbackResponse {
    pub status: String,

    #[oai(skip_serializing_if_is_none)]
    pub user_id: Option<String>,

    #[oai(skip_serializing_if_is_none)]
    pub tokens: Option<TokenResponse>,

    #[oai(skip_serializing_if_is_none)]
    pub state: Option<String>,

    #[oai(skip_serializing_if_is_none)]
    pub nickname: Option<String>,

    #[oai(skip_serializing_if_is_none)]
    pub message: Option<String>,
}

/// Request model for creating the account behind a pending WeChat login
#[derive(Object, Debug)]
pub struct WechatBindRequest {
    pub state: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,

    /// Optional; without one the account can only sign in through WeChat
    pub password: Option<String>,
}

/// Account created or linked by a WeChat bind
#[derive(Object, Debug)]
pub struct WechatBindResponse {
    pub id: String,
    pub username: String,
    pub email: String,

    #[oai(flatten)]
    pub tokens: TokenResponse,
}

/// Browser redirect used by the GitHub flow
#[derive(ApiResponse, Debug)]
pub enum RedirectResponse {
    #[oai(status = 302)]
    Found(#[oai(header = "Location")] String),
}

/// API response for WeChat bind
#[derive(ApiResponse)]
pub enum WechatBindApiResponse {
    /// The openid was already linked; signed in
    #[oai(status = 200)]
    Ok(Json<WechatBindResponse>),

    /// A new account was created for the openid
    #[oai(status = 201)]
    Created(Json<WechatBindResponse>),
}
