// Threshold governance lifecycle across services and stores

mod common;

use common::{create_user, setup_test_app};
use healthtrack_backend::errors::internal::ThresholdConfigError;
use healthtrack_backend::errors::{InternalError, ThresholdError};
use healthtrack_backend::stores::{HealthRecordStore, ThresholdStore};
use healthtrack_backend::types::internal::auth::Role;
use healthtrack_backend::types::internal::threshold::ThresholdValues;
use serde_json::json;

#[tokio::test]
async fn test_full_lifecycle_from_default_to_second_publish() {
    let app = setup_test_app().await;
    let root = create_user(&app, "root@example.com", Role::SuperAdmin).await;

    // Nothing stored yet: the built-in default is served
    let active = app.threshold_service.get_active().await.unwrap();
    assert_eq!(active.id, None);

    let installed = app.threshold_service.ensure_default_config(Some(&root.id)).await.unwrap();
    assert_eq!(installed.version, 1);
    assert_eq!(installed.status, "active");

    let mut tighter = ThresholdValues::DEFAULT.to_json();
    tighter["systolic_max"] = json!(115);
    let draft = app.threshold_service.create_draft(&tighter, &root.id).await.unwrap();
    assert_eq!(draft.version, 2);

    // A draft does not change what is in effect
    assert_eq!(app.threshold_service.get_active().await.unwrap().id, Some(installed.id));

    app.threshold_service.publish(draft.id, &root.id).await.unwrap();

    let active = app.threshold_service.get_active().await.unwrap();
    assert_eq!(active.id, Some(draft.id));
    assert_eq!(active.config.systolic_max, 115);

    let store = ThresholdStore::new();
    let previous = store.find_by_id(&app.db, installed.id).await.unwrap().unwrap();
    assert_eq!(previous.status.as_str(), "inactive");

    // created (default), created (draft), published
    let page = app.threshold_service.get_audit_logs(1, 20).await.unwrap();
    assert_eq!(page.total, 3);
    let actions: Vec<&str> = page.entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["published", "created", "created"]);
    assert_eq!(page.entries[0].operator.email.as_deref(), Some("root@example.com"));
}

#[tokio::test]
async fn test_out_of_bounds_draft_is_rejected_with_every_violation() {
    let app = setup_test_app().await;
    let root = create_user(&app, "root@example.com", Role::SuperAdmin).await;

    let config = json!({
        "systolic_min": 20,
        "systolic_max": 300,
        "diastolic_min": 80,
        "diastolic_max": 70,
        "heart_rate_min": 60,
        "heart_rate_max": 120,
    });

    let details = match app.threshold_service.create_draft(&config, &root.id).await {
        Err(InternalError::ThresholdConfig(ThresholdConfigError::Validation(details))) => details,
        other => panic!("Expected Validation, got {:?}", other.map(|_| ())),
    };
    assert_eq!(details.len(), 3);
    assert!(details.iter().any(|d| d == "diastolic_min must be less than diastolic_max"));
    assert!(details.iter().any(|d| d.starts_with("systolic_min must be between")));
    assert!(details.iter().any(|d| d.starts_with("systolic_max must be between")));

    // Nothing was written and the failure maps to a 400
    assert!(app.threshold_service.get_draft().await.unwrap().is_none());
    assert_eq!(app.threshold_service.get_audit_logs(1, 20).await.unwrap().total, 0);

    let api_error = ThresholdError::from(InternalError::ThresholdConfig(ThresholdConfigError::Validation(details)));
    assert!(matches!(api_error, ThresholdError::ValidationError(_)));
}

#[tokio::test]
async fn test_preview_does_not_persist_anything() {
    let app = setup_test_app().await;
    let patient = create_user(&app, "patient@example.com", Role::User).await;
    let records = HealthRecordStore::new();
    for (systolic, diastolic, at) in [(110, 70, 1), (114, 85, 2), (180, 110, 3)] {
        records
            .insert(&app.db, &patient.id, systolic, diastolic, Some(72), at)
            .await
            .unwrap();
    }

    let mut strict = ThresholdValues::DEFAULT.to_json();
    strict["systolic_max"] = json!(112);
    let preview = app.threshold_service.preview_impact(&strict).await.unwrap();

    assert_eq!(preview.total, 3);
    assert_eq!((preview.healthy, preview.borderline, preview.abnormal), (1, 1, 1));
    assert!(app.threshold_service.get_draft().await.unwrap().is_none());
}

#[tokio::test]
async fn test_reset_stages_default_without_touching_active() {
    let app = setup_test_app().await;
    let root = create_user(&app, "root@example.com", Role::SuperAdmin).await;

    let mut custom = ThresholdValues::DEFAULT.to_json();
    custom["heart_rate_max"] = json!(100);
    let draft = app.threshold_service.create_draft(&custom, &root.id).await.unwrap();
    app.threshold_service.publish(draft.id, &root.id).await.unwrap();

    let reset = app.threshold_service.reset_to_default(&root.id).await.unwrap();
    assert_eq!(reset.status, "draft");
    assert_eq!(reset.config, ThresholdValues::DEFAULT);

    let active = app.threshold_service.get_active().await.unwrap();
    assert_eq!(active.config.heart_rate_max, 100);
}

#[tokio::test]
async fn test_export_lists_entries_newest_first() {
    let app = setup_test_app().await;
    let root = create_user(&app, "root@example.com", Role::SuperAdmin).await;

    app.threshold_service.ensure_default_config(Some(&root.id)).await.unwrap();
    app.threshold_service.reset_to_default(&root.id).await.unwrap();

    let entries = app.threshold_service.export_audit_logs().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].id > entries[1].id);
    assert!(entries.iter().all(|e| e.old_config.is_none()));
}
