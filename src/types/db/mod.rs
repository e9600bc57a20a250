// Database entities - SeaORM models
pub mod health_record;
pub mod oauth_state;
pub mod refresh_token;
pub mod threshold_audit_log;
pub mod threshold_config;
pub mod user;
