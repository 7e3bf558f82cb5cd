//! Raw query documents: the loosely-typed parsing boundary.
//!
//! Accepts both the current camelCase field names and the legacy
//! capitalized ones. Shape ambiguities (scalar-or-list dimension values,
//! singular-or-plural statistics) are decoded into tagged unions here and
//! collapsed immediately, so nothing past this module ever sees them.

use metriq_core::{Dimensions, ParseError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A query document as authored, before any normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQueryDocument {
    #[serde(default, alias = "RefId", skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default, alias = "Region", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, alias = "Namespace", skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, alias = "MetricName", skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<String>,
    #[serde(default, alias = "Id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "Expression", skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_expression: Option<String>,
    /// `{name: "v"}` (legacy) or `{name: ["v1", "v2"]}`
    #[serde(default, alias = "Dimensions", skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Map<String, Value>>,
    #[serde(default, alias = "Statistic", skip_serializing_if = "Option::is_none")]
    pub statistic: Option<Value>,
    /// Legacy plural form; only the first entry survives migration
    #[serde(default, alias = "Statistics", skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Value>,
    /// Numeric string, number, or "auto"
    #[serde(default, alias = "Period", skip_serializing_if = "Option::is_none")]
    pub period: Option<Value>,
    #[serde(default, alias = "Alias", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, alias = "Label", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, alias = "Hide", skip_serializing_if = "Option::is_none")]
    pub hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_query_type: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_editor_mode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_exact: Option<bool>,
    #[serde(rename = "type", alias = "queryType", default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_matching: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_name_prefix: Option<String>,
    /// Fields this layer does not interpret, carried through migration untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawQueryDocument {
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_value(&self) -> Result<Value, ParseError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }

    pub fn metric_name(&self) -> &str {
        self.metric_name.as_deref().unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    pub fn expression(&self) -> &str {
        self.expression.as_deref().unwrap_or_default()
    }

    pub fn sql_expression(&self) -> &str {
        self.sql_expression.as_deref().unwrap_or_default()
    }

    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or_default()
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or_default()
    }

    /// Canonical dimensions, every value widened to a list
    pub fn normalized_dimensions(&self) -> Result<Dimensions, ParseError> {
        normalize_dimensions(self.dimensions.as_ref())
    }

    /// The single statistic this query asks for.
    ///
    /// A current `statistic` wins over the legacy `statistics` list; of any
    /// list only the first entry is kept.
    pub fn resolved_statistic(&self) -> Result<String, ParseError> {
        let field = match (&self.statistic, &self.statistics) {
            (Some(value), _) if !value.is_null() => StatisticField::from_json(value)?,
            (_, Some(value)) if !value.is_null() => StatisticField::from_json(value)?,
            _ => return Ok(String::new()),
        };
        Ok(field.into_first())
    }
}

/// One raw query plus its correlation key, as received in a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    pub ref_id: String,
    pub json: Value,
}

impl RawQuery {
    pub fn new(ref_id: impl Into<String>, json: Value) -> Self {
        Self {
            ref_id: ref_id.into(),
            json,
        }
    }

    /// Build from a document that carries its own `refId`
    pub fn from_document(json: Value) -> Self {
        let ref_id = json
            .get("refId")
            .or_else(|| json.get("RefId"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self { ref_id, json }
    }

    pub fn document(&self) -> Result<RawQueryDocument, ParseError> {
        RawQueryDocument::from_value(self.json.clone())
    }
}

/// A dimension value as it may appear in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionValue {
    Scalar(String),
    List(Vec<String>),
}

impl DimensionValue {
    pub fn from_json(key: &str, value: &Value) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidDimensionValue {
            key: key.to_string(),
        };
        match value {
            Value::String(s) => Ok(DimensionValue::Scalar(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<Result<Vec<_>, _>>()
                .map(DimensionValue::List),
            _ => Err(invalid()),
        }
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            DimensionValue::Scalar(s) => vec![s],
            DimensionValue::List(values) => values,
        }
    }
}

/// Widen every dimension value to a list; idempotent on canonical input
pub fn normalize_dimensions(raw: Option<&Map<String, Value>>) -> Result<Dimensions, ParseError> {
    let mut dimensions = Dimensions::new();
    for (key, value) in raw.into_iter().flatten() {
        let values = DimensionValue::from_json(key, value)?.into_values();
        dimensions.insert(key.clone(), values);
    }
    Ok(dimensions)
}

/// A statistic as it may appear in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatisticField {
    Single(String),
    Many(Vec<String>),
}

impl StatisticField {
    pub fn from_json(value: &Value) -> Result<Self, ParseError> {
        match value {
            Value::String(s) => Ok(StatisticField::Single(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or(ParseError::InvalidStatistic)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(StatisticField::Many),
            _ => Err(ParseError::InvalidStatistic),
        }
    }

    /// Lossy collapse: extra statistics are dropped
    pub fn into_first(self) -> String {
        match self {
            StatisticField::Single(s) => s,
            StatisticField::Many(values) => values.into_iter().next().unwrap_or_default(),
        }
    }
}
