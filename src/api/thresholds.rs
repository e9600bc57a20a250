use std::sync::Arc;

use chrono::Utc;
use poem::Request;
use poem_openapi::param::{Path, Query};
use poem_openapi::payload::{Json, PlainText};
use poem_openapi::{OpenApi, Tags};
use serde_json::Value;

use crate::api::auth::BearerAuth;
use crate::api::helpers;
use crate::errors::ThresholdError;
use crate::services::{AuthService, ThresholdService};
use crate::types::dto::common::{Pagination, format_timestamp};
use crate::types::dto::threshold::{
    ActiveThresholdResponse, AuditExportResponse, AuditLogDto, AuditLogsResponse, DraftCreatedApiResponse,
    DraftCreatedResponse, DraftResponse, ImpactPreviewResponse, PublishedResponse,
};
use crate::types::internal::auth::Role;
use crate::types::internal::threshold::{AuditLogEntry, SAFETY_BOUNDS};

const EXPORT_HEADER: [&str; 9] = [
    "ID",
    "Config ID",
    "Action",
    "Operator ID",
    "Operator Username",
    "Operator Email",
    "Old Config",
    "New Config",
    "Created At",
];

/// Threshold governance endpoints
///
/// Reading the active configuration needs any valid token; everything else
/// is SUPER_ADMIN only.
pub struct ThresholdApi {
    threshold_service: Arc<ThresholdService>,
    auth_service: Arc<AuthService>,
}

impl ThresholdApi {
    pub fn new(threshold_service: Arc<ThresholdService>, auth_service: Arc<AuthService>) -> Self {
        Self {
            threshold_service,
            auth_service,
        }
    }
}

#[derive(Tags)]
enum ThresholdTags {
    /// Health threshold configuration
    Thresholds,
}

#[OpenApi(prefix_path = "/superadmin/thresholds")]
impl ThresholdApi {
    /// Configuration currently in effect, with the safety bounds
    #[oai(path = "/active", method = "get", tag = "ThresholdTags::Thresholds")]
    async fn active(&self, req: &Request, auth: BearerAuth) -> Result<Json<ActiveThresholdResponse>, ThresholdError> {
        helpers::authorize(req, &auth, &self.auth_service, Role::User).await?;
        let active = self.threshold_service.get_active().await?;

        Ok(Json(ActiveThresholdResponse::new(active, SAFETY_BOUNDS)))
    }

    /// Latest draft, or null
    #[oai(path = "/draft", method = "get", tag = "ThresholdTags::Thresholds")]
    async fn draft(&self, req: &Request, auth: BearerAuth) -> Result<Json<DraftResponse>, ThresholdError> {
        helpers::authorize(req, &auth, &self.auth_service, Role::SuperAdmin).await?;
        let draft = self.threshold_service.get_draft().await?;

        Ok(Json(DraftResponse::from(draft)))
    }

    /// Store a new draft configuration
    #[oai(path = "/draft", method = "post", tag = "ThresholdTags::Thresholds")]
    async fn create_draft(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<Value>,
    ) -> Result<DraftCreatedApiResponse, ThresholdError> {
        let ctx = helpers::authorize(req, &auth, &self.auth_service, Role::SuperAdmin).await?;
        let record = self.threshold_service.create_draft(&body, &ctx.actor_id).await?;

        Ok(DraftCreatedApiResponse::Created(Json(DraftCreatedResponse::from(record))))
    }

    /// Classify recent readings under a candidate configuration
    #[oai(path = "/preview", method = "post", tag = "ThresholdTags::Thresholds")]
    async fn preview(
        &self,
        req: &Request,
        auth: BearerAuth,
        body: Json<Value>,
    ) -> Result<Json<ImpactPreviewResponse>, ThresholdError> {
        helpers::authorize(req, &auth, &self.auth_service, Role::SuperAdmin).await?;
        let preview = self.threshold_service.preview_impact(&body).await?;

        Ok(Json(ImpactPreviewResponse::from(preview)))
    }

    /// Make a draft the active configuration
    #[oai(path = "/:id/publish", method = "post", tag = "ThresholdTags::Thresholds")]
    async fn publish(
        &self,
        req: &Request,
        auth: BearerAuth,
        id: Path<i32>,
    ) -> Result<Json<PublishedResponse>, ThresholdError> {
        let ctx = helpers::authorize(req, &auth, &self.auth_service, Role::SuperAdmin).await?;
        let record = self.threshold_service.publish(id.0, &ctx.actor_id).await?;

        Ok(Json(PublishedResponse::from(record)))
    }

    /// Create a draft holding the default configuration
    #[oai(path = "/reset", method = "post", tag = "ThresholdTags::Thresholds")]
    async fn reset(&self, req: &Request, auth: BearerAuth) -> Result<DraftCreatedApiResponse, ThresholdError> {
        let ctx = helpers::authorize(req, &auth, &self.auth_service, Role::SuperAdmin).await?;
        let record = self.threshold_service.reset_to_default(&ctx.actor_id).await?;

        let mut response = DraftCreatedResponse::from(record);
        response.message = Some("Default threshold draft created. Publish to apply.".to_string());
        Ok(DraftCreatedApiResponse::Created(Json(response)))
    }

    /// Paginated audit history, newest first
    #[oai(path = "/audit-logs", method = "get", tag = "ThresholdTags::Thresholds")]
    async fn audit_logs(
        &self,
        req: &Request,
        auth: BearerAuth,
        page: Query<Option<u64>>,
        size: Query<Option<u64>>,
    ) -> Result<Json<AuditLogsResponse>, ThresholdError> {
        helpers::authorize(req, &auth, &self.auth_service, Role::SuperAdmin).await?;
        let (page, size) = helpers::page_params(page.0, size.0);
        let result = self.threshold_service.get_audit_logs(page, size).await?;

        Ok(Json(AuditLogsResponse {
            logs: result.entries.into_iter().map(AuditLogDto::from).collect(),
            pagination: Pagination::new(page, size, result.total),
        }))
    }

    /// Audit history as a CSV download
    #[oai(path = "/audit-logs/export", method = "get", tag = "ThresholdTags::Thresholds")]
    async fn export_audit_logs(&self, req: &Request, auth: BearerAuth) -> Result<AuditExportResponse, ThresholdError> {
        let ctx = helpers::authorize(req, &auth, &self.auth_service, Role::SuperAdmin).await?;
        let entries = self.threshold_service.export_audit_logs().await?;

        tracing::info!(request_id = %ctx.request_id, "Exporting {} threshold audit entries", entries.len());

        let filename = format!("threshold_audit_logs_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"));
        Ok(AuditExportResponse::Csv(
            PlainText(render_csv(&entries)),
            helpers::attachment_disposition("threshold_audit_logs.csv", &filename),
        ))
    }
}

/// CSV body with a UTF-8 byte order mark so spreadsheet tools detect the encoding
fn render_csv(entries: &[AuditLogEntry]) -> String {
    let mut out = String::from('\u{feff}');
    push_row(&mut out, EXPORT_HEADER.iter().map(|h| h.to_string()));

    for entry in entries {
        let old_config = entry.old_config.as_ref().map(Value::to_string).unwrap_or_default();
        push_row(
            &mut out,
            [
                entry.id.to_string(),
                entry.config_id.to_string(),
                entry.action.clone(),
                entry.operator.id.clone().unwrap_or_default(),
                entry.operator.username.clone(),
                entry.operator.email.clone().unwrap_or_default(),
                old_config,
                entry.new_config.to_string(),
                format_timestamp(entry.created_at),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let row = fields.into_iter().map(|f| csv_field(&f)).collect::<Vec<_>>().join(",");
    out.push_str(&row);
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
