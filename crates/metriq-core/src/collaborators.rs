//! Collaborator contracts: the only seams through which the core reaches I/O
use crate::data_model::{AlarmHistoryItem, AlarmRecord, ResolvedQuery, Sample, TimeRange};
use crate::error::TransportError;
use serde::{Deserialize, Serialize};

/// Fetches raw samples for a resolved query
pub trait TimeSeriesFetcher: Send + Sync {
    fn fetch(&self, query: &ResolvedQuery, region: &str) -> Result<Vec<Sample>, TransportError>;
}

/// Criteria sent to the alarm lister
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AlarmFilter {
    /// Discovery by name/action prefix, one page of `max_records`
    Prefix {
        action_prefix: String,
        alarm_name_prefix: String,
        max_records: i64,
    },
    /// Exact lookup of alarms attached to one metric
    ForMetric {
        namespace: String,
        metric_name: String,
        /// One (name, value) pair per listed dimension value
        dimensions: Vec<(String, String)>,
        statistic: String,
        period: i64,
    },
}

/// Lists alarm definitions and their state-change history
pub trait AlarmLister: Send + Sync {
    fn list_alarms(
        &self,
        region: &str,
        filter: &AlarmFilter,
    ) -> Result<Vec<AlarmRecord>, TransportError>;

    fn history(
        &self,
        region: &str,
        alarm_name: &str,
        range: &TimeRange,
        max_records: i64,
    ) -> Result<Vec<AlarmHistoryItem>, TransportError>;
}
