use crate::types::db::health_record;
use crate::types::internal::threshold::{Classification, ImpactPreview, ThresholdValues};

/// Share of a range's width tolerated outside the range as borderline
const BORDERLINE_MARGIN: f64 = 0.2;

/// Classify one reading against a configuration
///
/// A missing heart rate never counts against the reading.
pub fn classify(
    systolic: i32,
    diastolic: i32,
    heart_rate: Option<i32>,
    config: &ThresholdValues,
) -> Classification {
    let in_range = |value: i32, min: i32, max: i32| (min..=max).contains(&value);

    let systolic_ok = in_range(systolic, config.systolic_min, config.systolic_max);
    let diastolic_ok = in_range(diastolic, config.diastolic_min, config.diastolic_max);
    let heart_rate_ok = heart_rate.is_none_or(|hr| in_range(hr, config.heart_rate_min, config.heart_rate_max));

    if systolic_ok && diastolic_ok && heart_rate_ok {
        return Classification::Healthy;
    }

    let systolic_near = is_borderline(systolic, config.systolic_min, config.systolic_max);
    let diastolic_near = is_borderline(diastolic, config.diastolic_min, config.diastolic_max);
    let heart_rate_near = heart_rate.is_none_or(|hr| is_borderline(hr, config.heart_rate_min, config.heart_rate_max));

    if systolic_near && diastolic_near && heart_rate_near {
        Classification::Borderline
    } else {
        Classification::Abnormal
    }
}

fn is_borderline(value: i32, min: i32, max: i32) -> bool {
    let margin = f64::from(max - min) * BORDERLINE_MARGIN;
    let value = f64::from(value);
    if value < f64::from(min) {
        value >= f64::from(min) - margin
    } else if value > f64::from(max) {
        value <= f64::from(max) + margin
    } else {
        true
    }
}

/// Count classifications over a set of readings
pub fn summarize(records: &[health_record::Model], config: &ThresholdValues) -> ImpactPreview {
    let (mut healthy, mut borderline, mut abnormal) = (0u64, 0u64, 0u64);

    for record in records {
        match classify(record.systolic, record.diastolic, record.heart_rate, config) {
            Classification::Healthy => healthy += 1,
            Classification::Borderline => borderline += 1,
            Classification::Abnormal => abnormal += 1,
        }
    }

    let total = records.len() as u64;
    ImpactPreview {
        total,
        healthy,
        borderline,
        abnormal,
        healthy_pct: percentage(healthy, total),
        borderline_pct: percentage(borderline, total),
        abnormal_pct: percentage(abnormal, total),
    }
}

/// Percentage rounded to one decimal; 0 when there is nothing to count
fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: ThresholdValues = ThresholdValues::DEFAULT;

    fn record(systolic: i32, diastolic: i32, heart_rate: Option<i32>) -> health_record::Model {
        health_record::Model {
            id: 0,
            user_id: "u".to_string(),
            systolic,
            diastolic,
            heart_rate,
            recorded_at: 0,
        }
    }

    #[test]
    fn test_reading_inside_every_range_is_healthy() {
        assert_eq!(classify(100, 70, Some(75), &CONFIG), Classification::Healthy);
        assert_eq!(classify(90, 90, Some(60), &CONFIG), Classification::Healthy);
    }

    #[test]
    fn test_within_margin_is_borderline() {
        // systolic margin is (120 - 90) * 0.2 = 6
        assert_eq!(classify(125, 70, Some(75), &CONFIG), Classification::Borderline);
        assert_eq!(classify(126, 70, Some(75), &CONFIG), Classification::Borderline);
        assert_eq!(classify(84, 70, Some(75), &CONFIG), Classification::Borderline);
    }

    #[test]
    fn test_beyond_margin_is_abnormal() {
        assert_eq!(classify(150, 70, Some(75), &CONFIG), Classification::Abnormal);
        assert_eq!(classify(127, 70, Some(75), &CONFIG), Classification::Abnormal);
        assert_eq!(classify(100, 70, Some(120), &CONFIG), Classification::Abnormal);
    }

    #[test]
    fn test_missing_heart_rate_is_neutral() {
        assert_eq!(classify(100, 70, None, &CONFIG), Classification::Healthy);
        assert_eq!(classify(125, 70, None, &CONFIG), Classification::Borderline);
    }

    #[test]
    fn test_summarize_counts_add_up() {
        let records = vec![
            record(100, 70, Some(75)),
            record(125, 70, Some(75)),
            record(150, 70, Some(75)),
        ];

        let preview = summarize(&records, &CONFIG);
        assert_eq!(preview.total, 3);
        assert_eq!(preview.healthy + preview.borderline + preview.abnormal, preview.total);
        assert_eq!(preview.healthy_pct, 33.3);
        assert_eq!(preview.borderline_pct, 33.3);
        assert_eq!(preview.abnormal_pct, 33.3);
    }

    #[test]
    fn test_summarize_empty_has_zero_percentages() {
        let preview = summarize(&[], &CONFIG);
        assert_eq!(preview.total, 0);
        assert_eq!(preview.healthy_pct, 0.0);
        assert_eq!(preview.abnormal_pct, 0.0);
    }
}
