// API layer - HTTP endpoints
pub mod admin;
pub mod auth;
pub mod github;
pub mod health;
pub mod helpers;
pub mod thresholds;
pub mod wechat;

pub use admin::AdminApi;
pub use auth::{AuthApi, BearerAuth};
pub use github::GithubAuthApi;
pub use health::HealthApi;
pub use thresholds::ThresholdApi;
pub use wechat::WechatAuthApi;
