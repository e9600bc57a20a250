use std::net::IpAddr;

use poem::Request;
use uuid::Uuid;

use crate::errors::internal::CredentialError;
use crate::types::internal::auth::{Claims, Role};

/// Request context that flows through all layers
///
/// Carries the authenticated caller and request metadata needed for
/// role checks and logging in services.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// IP address of the client making the request
    pub ip_address: Option<IpAddr>,

    /// Unique identifier for this request (for tracing across layers)
    pub request_id: Uuid,

    /// Full JWT claims if authenticated
    pub claims: Option<Claims>,

    /// Actor who initiated the operation
    pub actor_id: String,
}

impl RequestContext {
    /// Create an unauthenticated context for an API request
    pub fn from_request(req: &Request) -> Self {
        Self {
            ip_address: extract_ip_address(req),
            request_id: Uuid::new_v4(),
            claims: None,
            actor_id: "anonymous".to_string(),
        }
    }

    /// Create a RequestContext for CLI operations
    pub fn for_cli(command_name: &str) -> Self {
        Self {
            ip_address: None,
            request_id: Uuid::new_v4(),
            claims: None,
            actor_id: format!("cli:{}", command_name),
        }
    }

    /// Set authentication state with claims
    pub fn with_claims(mut self, claims: Claims) -> Self {
        self.actor_id = claims.sub.clone();
        self.claims = Some(claims);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }

    /// User id of the authenticated caller
    pub fn user_id(&self) -> Option<&str> {
        self.claims.as_ref().map(|c| c.sub.as_str())
    }

    /// Ensure the caller is authenticated with at least `required`
    ///
    /// Returns the caller's user id.
    pub fn require_role(&self, required: Role) -> Result<&str, CredentialError> {
        let claims = self.claims.as_ref().ok_or_else(|| CredentialError::InvalidToken {
            token_type: "jwt".to_string(),
            reason: "missing".to_string(),
        })?;

        if !claims.role.satisfies(required) {
            return Err(CredentialError::InsufficientRole {
                required,
                actual: claims.role,
            });
        }

        Ok(&claims.sub)
    }
}

/// Extract the client address, preferring proxy headers
fn extract_ip_address(req: &Request) -> Option<IpAddr> {
    if let Some(forwarded) = req.header("X-Forwarded-For") {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().parse().ok();
        }
    }

    if let Some(real_ip) = req.header("X-Real-IP") {
        return real_ip.parse().ok();
    }

    req.remote_addr().as_socket_addr().map(|addr| addr.ip())
}
