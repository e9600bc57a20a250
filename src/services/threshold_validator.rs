use serde_json::{Map, Value};

use crate::types::internal::threshold::{SAFETY_BOUNDS, ThresholdValues};

/// Validate a raw threshold configuration
///
/// Structural problems (missing or non-integer fields) are reported alone;
/// ordering and safety-bound checks only run once all six fields are
/// integers. Every applicable error is collected.
pub fn validate(config: &Value) -> Result<ThresholdValues, Vec<String>> {
    let empty = Map::new();
    let object = config.as_object().unwrap_or(&empty);

    let mut errors = Vec::new();
    let mut parsed = [0i32; 6];

    for (slot, field) in parsed.iter_mut().zip(ThresholdValues::FIELDS) {
        match object.get(field) {
            None => errors.push(format!("Missing required field: {}", field)),
            Some(value) => match as_integer(value) {
                Some(n) => *slot = n,
                None => errors.push(format!("{} must be an integer", field)),
            },
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let values = ThresholdValues {
        systolic_min: parsed[0],
        systolic_max: parsed[1],
        diastolic_min: parsed[2],
        diastolic_max: parsed[3],
        heart_rate_min: parsed[4],
        heart_rate_max: parsed[5],
    };

    let errors = check_values(&values);
    if errors.is_empty() { Ok(values) } else { Err(errors) }
}

/// Ordering and safety-bound rules for an already typed configuration
pub fn check_values(values: &ThresholdValues) -> Vec<String> {
    let mut errors = Vec::new();

    let pairs = [
        ("systolic", values.systolic_min, values.systolic_max),
        ("diastolic", values.diastolic_min, values.diastolic_max),
        ("heart_rate", values.heart_rate_min, values.heart_rate_max),
    ];
    for (prefix, min, max) in pairs {
        if min >= max {
            errors.push(format!("{prefix}_min must be less than {prefix}_max"));
        }
    }

    let b = SAFETY_BOUNDS;
    let bounded = [
        ("systolic_min", values.systolic_min, b.systolic_min, b.systolic_max),
        ("systolic_max", values.systolic_max, b.systolic_min, b.systolic_max),
        ("diastolic_min", values.diastolic_min, b.diastolic_min, b.diastolic_max),
        ("diastolic_max", values.diastolic_max, b.diastolic_min, b.diastolic_max),
        ("heart_rate_min", values.heart_rate_min, b.heart_rate_min, b.heart_rate_max),
        ("heart_rate_max", values.heart_rate_max, b.heart_rate_min, b.heart_rate_max),
    ];
    for (field, value, lo, hi) in bounded {
        if !(lo..=hi).contains(&value) {
            errors.push(format!("{field} must be between {lo}-{hi}"));
        }
    }

    errors
}

// Booleans and floats are rejected even when they would fit an integer
fn as_integer(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        _ => None,
    }
}
