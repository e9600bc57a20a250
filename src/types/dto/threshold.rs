use poem_openapi::{ApiResponse, Object};
use poem_openapi::payload::{Json, PlainText};
use serde_json::Value;

use crate::types::dto::common::{Pagination, format_optional_timestamp, format_timestamp};
use crate::types::internal::threshold::{
    ActiveThreshold, AuditLogEntry, ImpactPreview, Operator, SafetyBounds, ThresholdRecord, ThresholdValues,
};

/// The six threshold integers
#[derive(Object, Debug, Clone, PartialEq)]
pub struct ThresholdConfigDto {
    pub systolic_min: i32,
    pub systolic_max: i32,
    pub diastolic_min: i32,
    pub diastolic_max: i32,
    pub heart_rate_min: i32,
    pub heart_rate_max: i32,
}

impl From<ThresholdValues> for ThresholdConfigDto {
    fn from(values: ThresholdValues) -> Self {
        Self {
            systolic_min: values.systolic_min,
            systolic_max: values.systolic_max,
            diastolic_min: values.diastolic_min,
            diastolic_max: values.diastolic_max,
            heart_rate_min: values.heart_rate_min,
            heart_rate_max: values.heart_rate_max,
        }
    }
}

/// Hard limits, exposed so clients can hint valid input ranges
#[derive(Object, Debug, Clone)]
pub struct SafetyBoundsDto {
    pub systolic_min: i32,
    pub systolic_max: i32,
    pub diastolic_min: i32,
    pub diastolic_max: i32,
    pub heart_rate_min: i32,
    pub heart_rate_max: i32,
}

impl From<SafetyBounds> for SafetyBoundsDto {
    fn from(bounds: SafetyBounds) -> Self {
        Self {
            systolic_min: bounds.systolic_min,
            systolic_max: bounds.systolic_max,
            diastolic_min: bounds.diastolic_min,
            diastolic_max: bounds.diastolic_max,
            heart_rate_min: bounds.heart_rate_min,
            heart_rate_max: bounds.heart_rate_max,
        }
    }
}

/// The configuration in effect
#[derive(Object, Debug)]
pub struct ActiveThresholdResponse {
    /// Null while the built-in default is in effect
    pub id: Option<i32>,
    pub config: ThresholdConfigDto,

    /// 0 while the built-in default is in effect
    pub version: i32,
    pub published_at: Option<String>,
    pub safety_bounds: SafetyBoundsDto,
}

impl ActiveThresholdResponse {
    pub fn new(active: ActiveThreshold, bounds: SafetyBounds) -> Self {
        Self {
            id: active.id,
            config: active.config.into(),
            version: active.version,
            published_at: format_optional_timestamp(active.published_at),
            safety_bounds: bounds.into(),
        }
    }
}

#[derive(Object, Debug)]
pub struct DraftSummary {
    pub id: i32,
    pub config: ThresholdConfigDto,
    pub version: i32,
    pub created_at: String,
}

/// Latest draft, if any
#[derive(Object, Debug)]
pub struct DraftResponse {
    pub draft: Option<DraftSummary>,
}

impl From<Option<ThresholdRecord>> for DraftResponse {
    fn from(record: Option<ThresholdRecord>) -> Self {
        Self {
            draft: record.map(|r| DraftSummary {
                id: r.id,
                config: r.config.into(),
                version: r.version,
                created_at: format_timestamp(r.created_at),
            }),
        }
    }
}

/// A newly created draft
#[derive(Object, Debug)]
pub struct DraftCreatedResponse {
    pub id: i32,
    pub config: ThresholdConfigDto,
    pub version: i32,
    pub status: String,
    pub created_at: String,

    #[oai(skip_serializing_if_is_none)]
    pub message: Option<String>,
}

impl From<ThresholdRecord> for DraftCreatedResponse {
    fn from(record: ThresholdRecord) -> Self {
        Self {
            id: record.id,
            config: record.config.into(),
            version: record.version,
            status: record.status,
            created_at: format_timestamp(record.created_at),
            message: None,
        }
    }
}

/// A configuration that just became active
#[derive(Object, Debug)]
pub struct PublishedResponse {
    pub id: i32,
    pub config: ThresholdConfigDto,
    pub version: i32,
    pub status: String,
    pub published_at: Option<String>,
}

impl From<ThresholdRecord> for PublishedResponse {
    fn from(record: ThresholdRecord) -> Self {
        Self {
            id: record.id,
            config: record.config.into(),
            version: record.version,
            status: record.status,
            published_at: format_optional_timestamp(record.published_at),
        }
    }
}

/// How recent readings would classify under a candidate configuration
#[derive(Object, Debug)]
pub struct ImpactPreviewResponse {
    pub total: u64,
    pub healthy: u64,
    pub borderline: u64,
    pub abnormal: u64,

    /// Percentages rounded to one decimal place
    pub healthy_pct: f64,
    pub borderline_pct: f64,
    pub abnormal_pct: f64,
}

impl From<ImpactPreview> for ImpactPreviewResponse {
    fn from(preview: ImpactPreview) -> Self {
        Self {
            total: preview.total,
            healthy: preview.healthy,
            borderline: preview.borderline,
            abnormal: preview.abnormal,
            healthy_pct: preview.healthy_pct,
            borderline_pct: preview.borderline_pct,
            abnormal_pct: preview.abnormal_pct,
        }
    }
}

#[derive(Object, Debug)]
pub struct OperatorDto {
    pub id: Option<String>,
    pub username: String,
    pub email: Option<String>,
}

impl From<Operator> for OperatorDto {
    fn from(operator: Operator) -> Self {
        Self {
            id: operator.id,
            username: operator.username,
            email: operator.email,
        }
    }
}

#[derive(Object, Debug)]
pub struct AuditLogDto {
    pub id: i32,
    pub config_id: i32,

    /// created or published
    pub action: String,
    pub operator: OperatorDto,
    pub old_config: Option<Value>,
    pub new_config: Value,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogDto {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            config_id: entry.config_id,
            action: entry.action,
            operator: entry.operator.into(),
            old_config: entry.old_config,
            new_config: entry.new_config,
            created_at: format_timestamp(entry.created_at),
        }
    }
}

/// One page of threshold audit history, newest first
#[derive(Object, Debug)]
pub struct AuditLogsResponse {
    pub logs: Vec<AuditLogDto>,
    pub pagination: Pagination,
}

/// API response for draft creation and reset
#[derive(ApiResponse)]
pub enum DraftCreatedApiResponse {
    /// Draft stored; publish it to make it active
    #[oai(status = 201)]
    Created(Json<DraftCreatedResponse>),
}

/// CSV download of the threshold audit history
#[derive(ApiResponse)]
pub enum AuditExportResponse {
    /// UTF-8 CSV with a byte order mark
    #[oai(status = 200, content_type = "text/csv; charset=utf-8")]
    Csv(PlainText<String>, #[oai(header = "Content-Disposition")] String),
}
