use std::sync::Arc;

use poem_openapi::{OpenApi, Tags, payload::Json};

use crate::errors::AuthError;
use crate::services::{BindRequest, WechatAuthService, WechatCallbackOutcome};
use crate::types::dto::auth::TokenResponse;
use crate::types::dto::oauth::{
    WechatBindApiResponse, WechatBindRequest, WechatBindResponse, WechatCallbackRequest, WechatCallbackResponse,
    WechatLoginResponse,
};

/// WeChat QR login endpoints
pub struct WechatAuthApi {
    wechat_service: Arc<WechatAuthService>,
}

impl WechatAuthApi {
    pub fn new(wechat_service: Arc<WechatAuthService>) -> Self {
        Self { wechat_service }
    }
}

#[derive(Tags)]
enum WechatTags {
    /// WeChat sign-in
    Wechat,
}

#[OpenApi(prefix_path = "/auth/wechat")]
impl WechatAuthApi {
    /// QR connect URL and the state it carries
    #[oai(path = "/login", method = "get", tag = "WechatTags::Wechat")]
    async fn login(&self) -> Result<Json<WechatLoginResponse>, AuthError> {
        let (qrcode_url, state) = self.wechat_service.begin_login().await?;
        Ok(Json(WechatLoginResponse { qrcode_url, state }))
    }

    /// Exchange the code delivered to the frontend after a scan
    #[oai(path = "/callback", method = "post", tag = "WechatTags::Wechat")]
    async fn callback(&self, body: Json<WechatCallbackRequest>) -> Result<Json<WechatCallbackResponse>, AuthError> {
        let code = body.code.as_deref().unwrap_or_default();
        let state = body.state.as_deref().unwrap_or_default();
        let outcome = self.wechat_service.handle_callback(code, state).await?;

        let response = match outcome {
            WechatCallbackOutcome::ExistingUser { user, tokens } => WechatCallbackResponse {
                status: "existing_user".to_string(),
                user_id: Some(user.id),
                tokens: Some(TokenResponse::from(tokens)),
                state: None,
                nickname: None,
                message: None,
            },
            WechatCallbackOutcome::NewUser { state, nickname } => WechatCallbackResponse {
                status: "new_user".to_string(),
                user_id: None,
                tokens: None,
                state: Some(state),
                nickname,
                message: Some("Complete registration by binding an email".to_string()),
            },
        };

        Ok(Json(response))
    }

    /// Create the account for a pending WeChat identity
    #[oai(path = "/bind", method = "post", tag = "WechatTags::Wechat")]
    async fn bind(&self, body: Json<WechatBindRequest>) -> Result<WechatBindApiResponse, AuthError> {
        let WechatBindRequest {
            state,
            username,
            email,
            password,
        } = body.0;

        let (user, tokens, created) = self
            .wechat_service
            .bind(BindRequest {
                state: state.unwrap_or_default(),
                username: username.unwrap_or_default(),
                email: email.unwrap_or_default(),
                password,
            })
            .await?;

        let response = Json(WechatBindResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            tokens: tokens.into(),
        });

        Ok(if created {
            WechatBindApiResponse::Created(response)
        } else {
            WechatBindApiResponse::Ok(response)
        })
    }
}
