// Services layer - Business logic and orchestration
pub mod admin_service;
pub mod auth_service;
pub mod classifier;
pub mod crypto;
pub mod github_auth_service;
pub mod identity_resolver;
pub mod oauth;
pub mod password_policy;
pub mod retry;
pub mod threshold_service;
pub mod threshold_validator;
pub mod token_service;
pub mod wechat_auth_service;

pub use admin_service::AdminService;
pub use auth_service::AuthService;
pub use github_auth_service::{GithubAuthService, GithubCallbackOutcome};
pub use identity_resolver::{EmailMatch, IdentityResolver};
pub use password_policy::{PasswordPolicy, PasswordValidationError};
pub use retry::RetryPolicy;
pub use threshold_service::ThresholdService;
pub use token_service::TokenService;
pub use wechat_auth_service::{BindRequest, WechatAuthService, WechatCallbackOutcome};
