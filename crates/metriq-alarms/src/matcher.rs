//! Alarm matching against partial metric criteria.
//!
//! Dimensions compare by key count and key presence only. Values are never
//! looked at, so `{A: x}` matches an alarm on `{A: y}`.

use metriq_core::{AlarmRecord, Dimensions};

/// Partial description of one metric series
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCriteria {
    /// Empty means "any namespace"
    pub namespace: String,
    /// Empty means "any metric"
    pub metric_name: String,
    /// Empty means "any dimension set"
    pub dimensions: Dimensions,
    /// Always compared, even when empty
    pub statistic: String,
    /// Zero means "any period"
    pub period: i64,
}

impl MatchCriteria {
    pub fn matches(&self, alarm: &AlarmRecord) -> bool {
        if !self.namespace.is_empty() && alarm.namespace != self.namespace {
            return false;
        }
        if !self.metric_name.is_empty() && alarm.metric_name != self.metric_name {
            return false;
        }
        if !self.dimension_keys_match(alarm) {
            return false;
        }
        if alarm.statistic != self.statistic {
            return false;
        }
        self.period == 0 || alarm.period == self.period
    }

    /// Same number of keys, and every filter key present on the alarm
    fn dimension_keys_match(&self, alarm: &AlarmRecord) -> bool {
        if self.dimensions.is_empty() {
            return true;
        }
        alarm.dimensions.len() == self.dimensions.len()
            && self
                .dimensions
                .keys()
                .all(|key| alarm.dimensions.contains_key(key))
    }
}

/// Names of the matching alarms, in candidate order
pub fn match_alarms(candidates: &[AlarmRecord], criteria: &MatchCriteria) -> Vec<String> {
    candidates
        .iter()
        .filter(|alarm| criteria.matches(alarm))
        .map(|alarm| alarm.alarm_name.clone())
        .collect()
}
