// API request and response models
pub mod admin;
pub mod auth;
pub mod common;
pub mod oauth;
pub mod threshold;
