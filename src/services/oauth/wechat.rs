use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::WechatSettings;
use crate::errors::InternalError;
use crate::errors::internal::OAuthError;
use crate::services::oauth::{http_client, with_query};

const QRCONNECT_URL: &str = "https://open.weixin.qq.com/connect/qrconnect";
const ACCESS_TOKEN_URL: &str = "https://api.weixin.qq.com/sns/oauth2/access_token";
const USERINFO_URL: &str = "https://api.weixin.qq.com/sns/userinfo";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WechatAccessToken {
    pub access_token: String,
    pub openid: String,
    pub unionid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WechatUserInfo {
    pub openid: String,
    pub nickname: Option<String>,
    pub headimgurl: Option<String>,
    pub unionid: Option<String>,
}

#[async_trait]
pub trait WechatApi: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<WechatAccessToken, InternalError>;

    async fn fetch_user_info(&self, access_token: &str, openid: &str) -> Result<WechatUserInfo, InternalError>;

    /// QR connect page the client renders for scanning
    fn qrcode_url(&self, state: &str) -> String;
}

/// WeChat open platform client
pub struct WechatClient {
    settings: WechatSettings,
    http: reqwest::Client,
}

impl WechatClient {
    pub fn new(settings: WechatSettings) -> Result<Self, InternalError> {
        Ok(Self {
            settings,
            http: http_client("wechat")?,
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T, InternalError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| OAuthError::upstream("wechat", format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OAuthError::upstream("wechat", format!("returned {}", response.status())).into());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OAuthError::upstream("wechat", format!("invalid payload: {}", e)))?;
        parse_payload(body)
    }
}

/// WeChat signals failure with 200 and an `errcode` field
fn parse_payload<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, InternalError> {
    if let Some(code) = body.get("errcode").and_then(|c| c.as_i64()).filter(|c| *c != 0) {
        let message = body.get("errmsg").and_then(|m| m.as_str()).unwrap_or("unknown error");
        return Err(OAuthError::upstream("wechat", format!("errcode {}: {}", code, message)).into());
    }

    serde_json::from_value(body).map_err(|e| OAuthError::upstream("wechat", format!("unexpected payload: {}", e)).into())
}

#[async_trait]
impl WechatApi for WechatClient {
    async fn exchange_code(&self, code: &str) -> Result<WechatAccessToken, InternalError> {
        self.get(
            ACCESS_TOKEN_URL,
            &[
                ("appid", self.settings.app_id.as_str()),
                ("secret", self.settings.app_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ],
        )
        .await
    }

    async fn fetch_user_info(&self, access_token: &str, openid: &str) -> Result<WechatUserInfo, InternalError> {
        self.get(USERINFO_URL, &[("access_token", access_token), ("openid", openid)])
            .await
    }

    fn qrcode_url(&self, state: &str) -> String {
        let url = with_query(
            QRCONNECT_URL,
            &[
                ("appid", self.settings.app_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "snsapi_login"),
                ("state", state),
            ],
        );
        format!("{}#wechat_redirect", url)
    }
}

impl std::fmt::Debug for WechatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WechatClient")
            .field("app_id", &self.settings.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_errcode_payload_is_upstream_failure() {
        let result: Result<WechatAccessToken, _> = parse_payload(json!({"errcode": 40029, "errmsg": "invalid code"}));
        match result {
            Err(InternalError::OAuth(OAuthError::Upstream { provider, message })) => {
                assert_eq!(provider, "wechat");
                assert!(message.contains("40029"));
            }
            other => panic!("Expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn test_token_payload_parses() {
        let token: WechatAccessToken = parse_payload(json!({
            "access_token": "at",
            "expires_in": 7200,
            "refresh_token": "rt",
            "openid": "o-1",
            "scope": "snsapi_login"
        }))
        .unwrap();
        assert_eq!(token.openid, "o-1");
        assert_eq!(token.unionid, None);
    }

    #[test]
    fn test_qrcode_url_shape() {
        let client = WechatClient::new(WechatSettings {
            app_id: "wx123".to_string(),
            app_secret: "s".to_string(),
            redirect_uri: "https://app.example.com/wechat".to_string(),
        })
        .unwrap();

        let url = client.qrcode_url("st");
        assert!(url.starts_with("https://open.weixin.qq.com/connect/qrconnect?appid=wx123&"));
        assert!(url.contains("scope=snsapi_login"));
        assert!(url.ends_with("state=st#wechat_redirect"));
    }
}
