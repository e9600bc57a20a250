use poem::Request;

use crate::api::auth::BearerAuth;
use crate::errors::InternalError;
use crate::services::AuthService;
use crate::types::internal::auth::Role;
use crate::types::internal::context::RequestContext;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Build the request context and attach the caller's validated claims
pub async fn authenticate(
    req: &Request,
    auth: &BearerAuth,
    auth_service: &AuthService,
) -> Result<RequestContext, InternalError> {
    auth_service
        .authenticate(RequestContext::from_request(req), &auth.0.token)
        .await
}

/// Like `authenticate`, then require at least `role`
pub async fn authorize(
    req: &Request,
    auth: &BearerAuth,
    auth_service: &AuthService,
    role: Role,
) -> Result<RequestContext, InternalError> {
    let ctx = authenticate(req, auth, auth_service).await?;
    ctx.require_role(role)?;
    Ok(ctx)
}

/// Normalize `page`/`size` query values: page >= 1, size in 1..=100
pub fn page_params(page: Option<u64>, size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, size)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
pub fn attachment_disposition(ascii_fallback: &str, filename: &str) -> String {
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults_and_clamps() {
        assert_eq!(page_params(None, None), (1, 20));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(page_params(Some(3), Some(500)), (3, 100));
    }

    #[test]
    fn test_attachment_disposition_encodes_utf8_name() {
        let header = attachment_disposition("logs.csv", "审计 logs.csv");
        assert_eq!(
            header,
            "attachment; filename=\"logs.csv\"; filename*=UTF-8''%E5%AE%A1%E8%AE%A1%20logs.csv"
        );
    }
}
