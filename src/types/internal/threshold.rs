use serde::{Deserialize, Serialize};

/// The six bounded integers that define healthy ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdValues {
    pub systolic_min: i32,
    pub systolic_max: i32,
    pub diastolic_min: i32,
    pub diastolic_max: i32,
    pub heart_rate_min: i32,
    pub heart_rate_max: i32,
}

impl ThresholdValues {
    /// Configuration used when nothing has been published yet
    pub const DEFAULT: ThresholdValues = ThresholdValues {
        systolic_min: 90,
        systolic_max: 120,
        diastolic_min: 60,
        diastolic_max: 90,
        heart_rate_min: 60,
        heart_rate_max: 90,
    };

    pub const FIELDS: [&'static str; 6] = [
        "systolic_min",
        "systolic_max",
        "diastolic_min",
        "diastolic_max",
        "heart_rate_min",
        "heart_rate_max",
    ];

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "systolic_min": self.systolic_min,
            "systolic_max": self.systolic_max,
            "diastolic_min": self.diastolic_min,
            "diastolic_max": self.diastolic_max,
            "heart_rate_min": self.heart_rate_min,
            "heart_rate_max": self.heart_rate_max,
        })
    }
}

impl Default for ThresholdValues {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Hard, non-configurable limits every configuration must stay inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SafetyBounds {
    pub systolic_min: i32,
    pub systolic_max: i32,
    pub diastolic_min: i32,
    pub diastolic_max: i32,
    pub heart_rate_min: i32,
    pub heart_rate_max: i32,
}

pub const SAFETY_BOUNDS: SafetyBounds = SafetyBounds {
    systolic_min: 30,
    systolic_max: 250,
    diastolic_min: 30,
    diastolic_max: 250,
    heart_rate_min: 30,
    heart_rate_max: 150,
};

/// Outcome of classifying one health reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Healthy,
    Borderline,
    Abnormal,
}

/// Aggregated classification counts over historical readings
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactPreview {
    pub total: u64,
    pub healthy: u64,
    pub borderline: u64,
    pub abnormal: u64,
    pub healthy_pct: f64,
    pub borderline_pct: f64,
    pub abnormal_pct: f64,
}

/// The configuration currently in effect
///
/// `id` is None and `version` is 0 when the built-in default is served.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveThreshold {
    pub id: Option<i32>,
    pub config: ThresholdValues,
    pub version: i32,
    pub published_at: Option<i64>,
}

/// A stored configuration record with its decoded values
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRecord {
    pub id: i32,
    pub config: ThresholdValues,
    pub version: i32,
    pub status: String,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub published_at: Option<i64>,
}

/// Operator details attached to an audit log entry
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub id: Option<String>,
    pub username: String,
    pub email: Option<String>,
}

impl Operator {
    pub fn unknown() -> Self {
        Self {
            id: None,
            username: "Unknown".to_string(),
            email: None,
        }
    }
}

/// An audit log entry enriched with its operator
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    pub id: i32,
    pub config_id: i32,
    pub action: String,
    pub operator: Operator,
    pub old_config: Option<serde_json::Value>,
    pub new_config: serde_json::Value,
    pub created_at: i64,
}

/// One page of audit entries plus the overall count
#[derive(Debug, Clone)]
pub struct AuditLogPage {
    pub total: u64,
    pub entries: Vec<AuditLogEntry>,
}
