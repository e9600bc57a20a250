// Internal types - not exposed over the API
pub mod auth;
pub mod context;
pub mod identity;
pub mod threshold;
