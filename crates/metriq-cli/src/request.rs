//! Request envelope read by the binary and the report it prints

use metriq_core::{ResolvedQuery, TimeRange};
use metriq_in::{QueryOutcome, RawQuery};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ "range": { "from": .., "to": .. }, "queries": [ .. ] }`
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub range: TimeRange,
    #[serde(default)]
    pub queries: Vec<Value>,
}

impl Request {
    pub fn from_json(input: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Queries keyed by their own `refId`; unnamed ones get their position
    pub fn raw_queries(&self) -> Vec<RawQuery> {
        self.queries
            .iter()
            .enumerate()
            .map(|(index, json)| {
                let query = RawQuery::from_document(json.clone());
                if query.ref_id.is_empty() {
                    RawQuery::new(index.to_string(), query.json)
                } else {
                    query
                }
            })
            .collect()
    }
}

/// One line of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeReport {
    pub ref_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<ResolvedQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<QueryOutcome> for OutcomeReport {
    fn from(outcome: QueryOutcome) -> Self {
        let (query, error) = match outcome.result {
            Ok(query) => (Some(query), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            ref_id: outcome.ref_id,
            query,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<OutcomeReport>,
}

impl Report {
    pub fn new(outcomes: Vec<QueryOutcome>) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes: outcomes.into_iter().map(OutcomeReport::from).collect(),
        }
    }
}
