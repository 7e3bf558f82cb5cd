//! Integration tests for the normalization pipeline.
//!
//! These exercise full request documents, legacy and current, through
//! migration and normalization against a pinned reference instant.

use chrono::{DateTime, Duration, TimeZone, Utc};
use metriq_core::{
    ApiMode, MetricEditorMode, MetricQueryType, NormalizeContext, NormalizerSettings, ParseError,
    QueryError, TimeRange,
};
use metriq_in::{
    is_valid_metric_data_id, migrate_legacy_queries, normalize, Normalizer, RawQuery,
    RawQueryDocument,
};
use serde_json::{json, Value};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
}

fn ctx() -> NormalizeContext {
    NormalizeContext::new(now())
}

fn hour_window() -> TimeRange {
    TimeRange::new(now() - Duration::hours(2), now() - Duration::hours(1))
}

fn doc(value: Value) -> RawQueryDocument {
    RawQueryDocument::from_value(value).unwrap()
}

fn auto_doc() -> RawQueryDocument {
    doc(json!({
        "refId": "ref1",
        "region": "us-east-1",
        "namespace": "ec2",
        "metricName": "CPUUtilization",
        "id": "",
        "expression": "",
        "dimensions": { "InstanceId": ["test"], "InstanceType": ["test2"] },
        "statistic": "Average",
        "hide": false,
        "period": "auto"
    }))
}

fn auto_period(window: Duration, ending_ago: Duration) -> i64 {
    let to = now() - ending_ago;
    let range = TimeRange::new(to - window, to);
    normalize(&auto_doc(), "ref1", &range, &ctx()).unwrap().period
}

// =============================================================================
// Dimensions
// =============================================================================

#[test]
fn test_new_dimensions_structure() {
    let raw = doc(json!({
        "refId": "ref1",
        "region": "us-east-1",
        "namespace": "ec2",
        "metricName": "CPUUtilization",
        "id": "",
        "expression": "",
        "dimensions": {
            "InstanceId": ["test"],
            "InstanceType": ["test2", "test3"]
        },
        "statistic": "Average",
        "period": "600",
        "hide": false
    }));

    let res = normalize(&raw, "ref1", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.region, "us-east-1");
    assert_eq!(res.ref_id, "ref1");
    assert_eq!(res.namespace, "ec2");
    assert_eq!(res.metric_name, "CPUUtilization");
    assert_eq!(res.id, "queryref1");
    assert!(res.expression.is_empty());
    assert_eq!(res.period, 600);
    assert!(res.return_data);
    assert_eq!(res.dimensions.len(), 2);
    assert_eq!(res.dimensions["InstanceId"].len(), 1);
    assert_eq!(res.dimensions["InstanceType"].len(), 2);
    assert_eq!(res.dimensions["InstanceType"][1], "test3");
    assert_eq!(res.statistic, "Average");
}

#[test]
fn test_old_dimensions_structure() {
    let raw = doc(json!({
        "refId": "ref1",
        "region": "us-east-1",
        "namespace": "ec2",
        "metricName": "CPUUtilization",
        "dimensions": { "InstanceId": "test", "InstanceType": "test2" },
        "statistic": "Average",
        "period": "600",
        "hide": false
    }));

    let res = normalize(&raw, "ref1", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.dimensions.len(), 2);
    assert_eq!(res.dimensions["InstanceId"], vec!["test".to_string()]);
    assert_eq!(res.dimensions["InstanceType"], vec!["test2".to_string()]);
}

#[test]
fn test_invalid_dimension_value_names_key() {
    let raw = doc(json!({
        "dimensions": { "InstanceId": { "value": "test" } },
        "statistic": "Average",
        "period": "600"
    }));

    assert_eq!(
        normalize(&raw, "ref1", &hour_window(), &ctx()).unwrap_err(),
        QueryError::Parse(ParseError::InvalidDimensionValue {
            key: "InstanceId".to_string()
        })
    );
}

// =============================================================================
// Period
// =============================================================================

#[test]
fn test_user_period_used_when_range_is_short() {
    let mut raw = auto_doc();
    raw.period = Some(json!("900"));
    let res = normalize(&raw, "ref1", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.period, 900);
}

#[test]
fn test_user_period_ignores_age_floor() {
    let mut raw = auto_doc();
    raw.period = Some(json!("60"));
    let to = now() - Duration::days(500);
    let res = normalize(&raw, "ref1", &TimeRange::new(to - Duration::days(2), to), &ctx()).unwrap();
    assert_eq!(res.period, 60);
}

#[test]
fn test_auto_period_by_range() {
    assert_eq!(auto_period(Duration::minutes(5), Duration::zero()), 60);
    assert_eq!(auto_period(Duration::days(1), Duration::zero()), 60);
    assert_eq!(auto_period(Duration::days(2), Duration::zero()), 300);
    assert_eq!(auto_period(Duration::days(7), Duration::zero()), 900);
    assert_eq!(auto_period(Duration::days(30), Duration::zero()), 3_600);
    assert_eq!(auto_period(Duration::days(90), Duration::zero()), 21_600);
    assert_eq!(auto_period(Duration::days(365), Duration::zero()), 21_600);
    assert_eq!(auto_period(Duration::days(730), Duration::zero()), 86_400);
}

#[test]
fn test_auto_period_by_age() {
    assert_eq!(auto_period(Duration::days(2), Duration::days(14)), 300);
    assert_eq!(auto_period(Duration::days(2), Duration::days(88)), 3_600);
    assert_eq!(auto_period(Duration::days(2), Duration::days(454)), 21_600);
}

#[test]
fn test_auto_period_range_ending_days_ago() {
    assert_eq!(auto_period(Duration::days(2), Duration::days(16)), 300);
    assert_eq!(auto_period(Duration::days(2), Duration::days(90)), 3_600);
    assert_eq!(auto_period(Duration::days(2), Duration::days(456)), 21_600);
}

#[test]
fn test_numeric_period_accepted() {
    let mut raw = auto_doc();
    raw.period = Some(json!(120));
    assert_eq!(normalize(&raw, "ref1", &hour_window(), &ctx()).unwrap().period, 120);
}

// =============================================================================
// Modes and identifiers
// =============================================================================

#[test]
fn test_metric_search_builder_by_default() {
    let res = normalize(&auto_doc(), "ref1", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.metric_query_type, MetricQueryType::Search);
    assert_eq!(res.metric_editor_mode, MetricEditorMode::Builder);
    assert_eq!(res.api_mode, ApiMode::MetricStat);
}

#[test]
fn test_expression_makes_math_expression() {
    let mut raw = auto_doc();
    raw.expression = Some("SUM(a)".to_string());
    let res = normalize(&raw, "ref1", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.metric_query_type, MetricQueryType::Search);
    assert_eq!(res.metric_editor_mode, MetricEditorMode::Raw);
    assert_eq!(res.api_mode, ApiMode::MathExpression);
}

#[test]
fn test_id_from_valid_ref_id() {
    let res = normalize(&auto_doc(), "ref1", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.ref_id, "ref1");
    assert_eq!(res.id, "queryref1");
}

#[test]
fn test_id_generated_for_invalid_ref_id() {
    let res = normalize(&auto_doc(), "$$", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.ref_id, "$$");
    assert!(is_valid_metric_data_id(&res.id, metriq_core::MAX_ID_LENGTH));
}

#[test]
fn test_label_kept_and_alias_unmodified() {
    let mut raw = auto_doc();
    raw.alias = Some("some alias".to_string());
    raw.label = Some("some label".to_string());
    let res = normalize(&raw, "ref1", &hour_window(), &ctx()).unwrap();
    assert_eq!(res.alias, "some alias");
    assert_eq!(res.label, "some label");
}

// =============================================================================
// Migration and batches
// =============================================================================

#[test]
fn test_legacy_statistics_migrated() {
    let results = migrate_legacy_queries(
        &[RawQuery::new(
            "A",
            json!({
                "Region": "us-east-1",
                "Namespace": "ec2",
                "MetricName": "CPUUtilization",
                "Dimensions": { "InstanceId": ["test"] },
                "Statistics": ["Average", "Sum"],
                "Period": "600",
                "Hide": false
            }),
        )],
        false,
    );

    assert_eq!(results.len(), 1);
    let migrated = results[0].as_ref().unwrap();
    assert_eq!(migrated.ref_id, "A");
    assert_eq!(migrated.json["statistic"], "Average");
    assert!(migrated.json["statistic"].as_array().is_none());
}

#[test]
fn test_multiple_queries_migrate_labels() {
    let results = migrate_legacy_queries(
        &[
            RawQuery::new("A", json!({ "alias": "{{period}} {{any_other_word}}", "period": "600" })),
            RawQuery::new("B", json!({ "alias": "{{  label }}", "period": "600" })),
        ],
        true,
    );

    assert_eq!(
        results[0].as_ref().unwrap().json["label"],
        "${PROP('Period')} ${PROP('Dim.any_other_word')}"
    );
    assert_eq!(results[1].as_ref().unwrap().json["label"], "${LABEL}");
    assert_eq!(results[1].as_ref().unwrap().json["alias"], "{{  label }}");
}

#[test]
fn test_batch_partial_failure() {
    let normalizer = Normalizer::new(ctx());
    let queries = vec![
        RawQuery::new(
            "A",
            json!({ "namespace": "ec2", "metricName": "CPUUtilization", "statistic": "Average", "period": "often" }),
        ),
        RawQuery::new(
            "B",
            json!({ "namespace": "ec2", "metricName": "CPUUtilization", "statistic": "Average", "period": "300" }),
        ),
    ];

    let outcomes = normalizer.normalize_batch(&queries, &hour_window());
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].result,
        Err(QueryError::Parse(ParseError::InvalidPeriod { .. }))
    ));
    let sibling = outcomes[1].result.as_ref().unwrap();
    assert_eq!(sibling.id, "queryB");
    assert_eq!(sibling.period, 300);
}

#[test]
fn test_malformed_document_fails_alone() {
    let normalizer = Normalizer::new(ctx());
    let queries = vec![
        RawQuery::new("A", json!({ "hide": "nope" })),
        RawQuery::new("B", json!({ "statistic": "Sum" })),
    ];

    let outcomes = normalizer.normalize_batch(&queries, &hour_window());
    assert!(matches!(
        outcomes[0].result,
        Err(QueryError::Parse(ParseError::Malformed(_)))
    ));
    assert!(outcomes[1].is_ok());
}

#[test]
fn test_dynamic_labels_setting_drives_migration() {
    let settings = NormalizerSettings::from_yaml("dynamicLabels: true\n").unwrap();
    let normalizer = Normalizer::new(ctx().with_settings(settings));
    let queries = vec![RawQuery::from_document(json!({
        "refId": "A",
        "alias": "{{ region }}/{{InstanceId}}",
        "statistic": "Maximum",
        "period": "auto"
    }))];

    let outcomes = normalizer.migrate_and_normalize(&queries, &hour_window());
    let resolved = outcomes[0].result.as_ref().unwrap();
    assert_eq!(resolved.label, "${PROP('Region')}/${PROP('Dim.InstanceId')}");
    assert_eq!(resolved.alias, "{{ region }}/{{InstanceId}}");
    assert_eq!(resolved.period, 60);
}

#[test]
fn test_generated_id_fits_configured_length() {
    let settings = NormalizerSettings::from_yaml("maxIdLength: 24\n").unwrap();
    let normalizer = Normalizer::new(ctx().with_settings(settings));
    let queries = vec![RawQuery::new("$$", json!({ "statistic": "Sum", "period": "60" }))];

    let outcomes = normalizer.normalize_batch(&queries, &hour_window());
    let id = &outcomes[0].result.as_ref().unwrap().id;
    assert_eq!(id.len(), 24);
    assert!(is_valid_metric_data_id(id, 24));
}

#[test]
fn test_derived_and_explicit_ids_never_conflict() {
    let normalizer = Normalizer::new(ctx());
    let queries = vec![
        RawQuery::from_document(json!({ "refId": "B", "statistic": "Sum", "period": "60" })),
        RawQuery::from_document(json!({
            "refId": "X",
            "id": "queryB",
            "statistic": "Sum",
            "period": "60"
        })),
    ];

    let outcomes = normalizer.migrate_and_normalize(&queries, &hour_window());
    assert!(outcomes.iter().all(|o| o.is_ok()));
    let first = outcomes[0].result.as_ref().unwrap();
    let second = outcomes[1].result.as_ref().unwrap();
    assert_eq!(second.id, "queryB");
    assert_ne!(first.id, second.id);
    assert!(is_valid_metric_data_id(&first.id, metriq_core::MAX_ID_LENGTH));
}
