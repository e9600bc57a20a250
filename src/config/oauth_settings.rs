use std::fmt;
use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ApplicationError;

/// GitHub OAuth application credentials
#[derive(Clone)]
pub struct GithubSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// WeChat open platform application credentials
#[derive(Clone)]
pub struct WechatSettings {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
}

/// Identity provider settings; a provider is disabled when its id is unset
#[derive(Clone, Default)]
pub struct OAuthSettings {
    pub github: Option<GithubSettings>,
    pub wechat: Option<WechatSettings>,
}

impl OAuthSettings {
    pub fn from_env_provider(env_provider: Arc<dyn EnvironmentProvider>) -> Result<Self, ApplicationError> {
        let optional = |name: &str| ConfigSpec::new(env_provider.clone()).env_override(name).load();
        let required = |name: &str| {
            ConfigSpec::new(env_provider.clone())
                .env_override(name)
                .required(true)
                .min_length(1)
                .load_value()
        };

        let github = match optional("GITHUB_CLIENT_ID")? {
            Some(client_id) => Some(GithubSettings {
                client_id,
                client_secret: required("GITHUB_CLIENT_SECRET")?,
                redirect_uri: ConfigSpec::new(env_provider.clone())
                    .env_override("GITHUB_REDIRECT_URI")
                    .required(true)
                    .validator(ConfigSpec::validate_http_url)
                    .load_value()?,
            }),
            None => None,
        };

        let wechat = match optional("WECHAT_APP_ID")? {
            Some(app_id) => Some(WechatSettings {
                app_id,
                app_secret: required("WECHAT_APP_SECRET")?,
                redirect_uri: ConfigSpec::new(env_provider.clone())
                    .env_override("WECHAT_REDIRECT_URI")
                    .required(true)
                    .validator(ConfigSpec::validate_http_url)
                    .load_value()?,
            }),
            None => None,
        };

        Ok(Self { github, wechat })
    }
}

impl fmt::Debug for GithubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl fmt::Debug for WechatSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WechatSettings")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

impl fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("github", &self.github)
            .field("wechat", &self.wechat)
            .finish()
    }
}
