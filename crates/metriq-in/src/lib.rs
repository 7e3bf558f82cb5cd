//! Metriq-IN: raw query documents to canonical, execution-ready queries
//!
//! This crate is the parsing boundary. It accepts legacy and current query
//! shapes, resolves "auto" periods, derives safe identifiers and migrates
//! legacy aliases into dynamic labels.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use metriq_core::{NormalizeContext, TimeRange};
//! use metriq_in::{Normalizer, RawQuery};
//! use serde_json::json;
//!
//! let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
//! let normalizer = Normalizer::new(NormalizeContext::new(now));
//! let range = TimeRange::new(now - Duration::days(7), now);
//!
//! let outcomes = normalizer.normalize_batch(
//!     &[RawQuery::new("A", json!({
//!         "region": "us-east-1",
//!         "namespace": "AWS/EC2",
//!         "metricName": "CPUUtilization",
//!         "dimensions": { "InstanceId": "i-0abc" },
//!         "statistic": "Average",
//!         "period": "auto"
//!     }))],
//!     &range,
//! );
//!
//! let query = outcomes[0].result.as_ref().unwrap();
//! assert_eq!(query.id, "queryA");
//! assert_eq!(query.period, 900);
//! assert_eq!(query.dimensions["InstanceId"], vec!["i-0abc".to_string()]);
//! ```

pub mod identifier;
pub mod labels;
pub mod migration;
pub mod normalizer;
pub mod period;
pub mod plan;
pub mod raw;

pub use identifier::{generate_id, is_valid_metric_data_id, resolve_id};
pub use labels::{migrate_alias, should_migrate};
pub use migration::{migrate_document, migrate_legacy_queries, migrate_query};
pub use normalizer::{normalize, Normalizer, QueryOutcome};
pub use period::{auto_period, resolve_period, PeriodRequest};
pub use plan::{fetch_plan, plan_by_region, FetchOutcome, RegionPlan};
pub use raw::{normalize_dimensions, DimensionValue, RawQuery, RawQueryDocument, StatisticField};
