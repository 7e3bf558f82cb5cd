//! Data Model: ResolvedQuery, AlarmRecord, AnnotationEvent
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical dimension set: name → one or more values
pub type Dimensions = BTreeMap<String, Vec<String>>;

/// Absolute time window of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Length of the window; negative when `to` precedes `from`
    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

/// How the series are addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricQueryType {
    #[default]
    Search,
    Query,
}

impl MetricQueryType {
    /// Numeric code used by query documents (0 = search, 1 = query)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Search),
            1 => Some(Self::Query),
            _ => None,
        }
    }
}

/// Whether the query was assembled by the builder or typed by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricEditorMode {
    #[default]
    Builder,
    Raw,
}

impl MetricEditorMode {
    /// Numeric code used by query documents (0 = builder, 1 = raw)
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Builder),
            1 => Some(Self::Raw),
            _ => None,
        }
    }
}

/// Shape of the request sent to the remote metric-data API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiMode {
    MetricStat,
    MathExpression,
    SqlExpression,
}

impl ApiMode {
    /// Derive the API mode from the query type, editor mode and expression.
    ///
    /// Query-type queries always go out as SQL. Search queries go out as a
    /// math expression only when they are raw and actually carry one.
    pub fn derive(
        query_type: MetricQueryType,
        editor_mode: MetricEditorMode,
        expression: &str,
    ) -> Self {
        match (query_type, editor_mode) {
            (MetricQueryType::Query, _) => ApiMode::SqlExpression,
            (MetricQueryType::Search, MetricEditorMode::Raw) if !expression.is_empty() => {
                ApiMode::MathExpression
            }
            _ => ApiMode::MetricStat,
        }
    }
}

/// Normalized, execution-ready representation of one user query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedQuery {
    /// Caller-supplied correlation key
    pub ref_id: String,
    /// Execution-scope identifier, always identifier-safe
    pub id: String,
    pub region: String,
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Dimensions,
    pub statistic: String,
    /// Concrete sampling interval in seconds
    pub period: i64,
    pub expression: String,
    pub sql_expression: String,
    pub metric_query_type: MetricQueryType,
    pub metric_editor_mode: MetricEditorMode,
    pub api_mode: ApiMode,
    pub match_exact: bool,
    /// Legacy alias, kept verbatim
    pub alias: String,
    pub label: String,
    /// False when the series is only an operand of another expression
    pub return_data: bool,
}

/// Alarm definition as returned by the alarm lister
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRecord {
    pub alarm_name: String,
    pub namespace: String,
    pub metric_name: String,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
    #[serde(default)]
    pub statistic: String,
    #[serde(default)]
    pub period: i64,
}

/// One state-change entry from an alarm's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmHistoryItem {
    pub timestamp: DateTime<Utc>,
    pub alarm_name: String,
    pub history_type: String,
    pub summary: String,
}

/// Flattened annotation built from alarm history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationEvent {
    pub title: String,
    pub time: DateTime<Utc>,
    pub tags: String,
    pub text: String,
}

impl From<AlarmHistoryItem> for AnnotationEvent {
    fn from(item: AlarmHistoryItem) -> Self {
        Self {
            title: item.alarm_name,
            time: item.timestamp,
            tags: item.history_type,
            text: item.summary,
        }
    }
}

/// Raw metric sample returned by the fetcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}
