// API-facing error types
pub mod admin;
pub mod auth;
pub mod threshold;

// Re-exports for convenience
pub use admin::AdminError;
pub use auth::AuthError;
pub use threshold::ThresholdError;

use crate::types::internal::auth::Role;

/// Message used by every role gate rejection
pub(crate) fn forbidden_message(required: Role) -> String {
    format!("Forbidden: {} role required", required.as_str())
}
