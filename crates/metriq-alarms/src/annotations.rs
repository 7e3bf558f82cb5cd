//! Annotation assembly from alarm history.
//!
//! Two ways to find alarms: an exact lookup for one metric, or discovery by
//! name/action prefix followed by a local match over the single page the
//! lister returns. Each found alarm's history is then flattened into events.

use crate::matcher::{match_alarms, MatchCriteria};
use chrono::{DateTime, Utc};
use metriq_core::{
    AlarmFilter, AlarmLister, AnnotationEvent, Dimensions, NormalizeContext, QueryError,
    TimeRange, TransportError, ValidationError,
};
use metriq_in::{auto_period, PeriodRequest, RawQueryDocument};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while assembling annotations
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("failed to call {operation}: {source}")]
    Lister {
        operation: &'static str,
        #[source]
        source: TransportError,
    },
}

/// An annotation request after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationQuery {
    pub region: String,
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Dimensions,
    pub statistic: String,
    /// Zero only in prefix mode, meaning "any period"
    pub period: i64,
    pub prefix_matching: bool,
    pub action_prefix: String,
    pub alarm_name_prefix: String,
}

impl AnnotationQuery {
    pub fn parse(
        raw: &RawQueryDocument,
        range: &TimeRange,
        ctx: &NormalizeContext,
    ) -> Result<Self, QueryError> {
        let prefix_matching = raw.prefix_matching.unwrap_or(false);

        let mut period = match PeriodRequest::decode(raw.period.as_ref())? {
            PeriodRequest::Explicit(seconds) => seconds,
            PeriodRequest::Auto => auto_period(range, ctx.now),
            PeriodRequest::Unset => 0,
        };
        if period == 0 && !prefix_matching {
            period = ctx.settings.default_period;
        }

        let region = match raw.region() {
            "" => String::new(),
            region => ctx.settings.region_or_default(region),
        };

        Ok(Self {
            region,
            namespace: raw.namespace().to_string(),
            metric_name: raw.metric_name().to_string(),
            dimensions: raw.normalized_dimensions()?,
            statistic: raw.resolved_statistic()?,
            period,
            prefix_matching,
            action_prefix: raw.action_prefix.clone().unwrap_or_default(),
            alarm_name_prefix: raw.alarm_name_prefix.clone().unwrap_or_default(),
        })
    }

    /// Exact lookups need region, namespace, metric name and statistic
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.prefix_matching {
            return Ok(());
        }
        let missing: Vec<&'static str> = [
            ("region", &self.region),
            ("namespace", &self.namespace),
            ("metricName", &self.metric_name),
            ("statistic", &self.statistic),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingAnnotationFields { missing })
        }
    }

    /// Filter sent to the alarm lister
    pub fn filter(&self, max_records: i64) -> AlarmFilter {
        if self.prefix_matching {
            return AlarmFilter::Prefix {
                action_prefix: self.action_prefix.clone(),
                alarm_name_prefix: self.alarm_name_prefix.clone(),
                max_records,
            };
        }
        let dimensions = self
            .dimensions
            .iter()
            .flat_map(|(name, values)| {
                values
                    .iter()
                    .map(move |value| (name.clone(), value.clone()))
            })
            .collect();
        AlarmFilter::ForMetric {
            namespace: self.namespace.clone(),
            metric_name: self.metric_name.clone(),
            dimensions,
            statistic: self.statistic.clone(),
            period: self.period,
        }
    }

    /// Local post-filter applied to prefix discovery results
    pub fn criteria(&self) -> MatchCriteria {
        MatchCriteria {
            namespace: self.namespace.clone(),
            metric_name: self.metric_name.clone(),
            dimensions: self.dimensions.clone(),
            statistic: self.statistic.clone(),
            period: self.period,
        }
    }
}

/// Drives an `AlarmLister` to turn an annotation query into events
pub struct AnnotationAssembler<'a, L: AlarmLister + ?Sized> {
    lister: &'a L,
    max_records: i64,
}

impl<'a, L: AlarmLister + ?Sized> AnnotationAssembler<'a, L> {
    pub fn new(lister: &'a L, max_records: i64) -> Self {
        Self {
            lister,
            max_records,
        }
    }

    /// Names of the alarms relevant to `query`
    pub fn alarm_names(&self, query: &AnnotationQuery) -> Result<Vec<String>, AnnotationError> {
        query.validate().map_err(QueryError::from)?;

        let filter = query.filter(self.max_records);
        let alarms = self
            .lister
            .list_alarms(&query.region, &filter)
            .map_err(|source| AnnotationError::Lister {
                operation: list_operation(&filter),
                source,
            })?;

        let names = if query.prefix_matching {
            match_alarms(&alarms, &query.criteria())
        } else {
            alarms.into_iter().map(|alarm| alarm.alarm_name).collect()
        };
        tracing::debug!(
            prefix_matching = query.prefix_matching,
            alarms = names.len(),
            "resolved annotation alarms"
        );
        Ok(names)
    }

    /// History events of every relevant alarm, concatenated in alarm order
    pub fn assemble(
        &self,
        query: &AnnotationQuery,
        range: &TimeRange,
    ) -> Result<Vec<AnnotationEvent>, AnnotationError> {
        let mut events = Vec::new();
        for alarm_name in self.alarm_names(query)? {
            let history = self
                .lister
                .history(&query.region, &alarm_name, range, self.max_records)
                .map_err(|source| AnnotationError::Lister {
                    operation: "DescribeAlarmHistory",
                    source,
                })?;
            events.extend(history.into_iter().map(AnnotationEvent::from));
        }
        Ok(events)
    }
}

fn list_operation(filter: &AlarmFilter) -> &'static str {
    match filter {
        AlarmFilter::Prefix { .. } => "DescribeAlarms",
        AlarmFilter::ForMetric { .. } => "DescribeAlarmsForMetric",
    }
}

/// Annotation events laid out as parallel columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationFrame {
    pub ref_id: String,
    pub time: Vec<DateTime<Utc>>,
    pub title: Vec<String>,
    pub tags: Vec<String>,
    pub text: Vec<String>,
    pub row_count: usize,
}

impl AnnotationFrame {
    pub fn from_events(ref_id: impl Into<String>, events: Vec<AnnotationEvent>) -> Self {
        let mut frame = Self {
            ref_id: ref_id.into(),
            time: Vec::with_capacity(events.len()),
            title: Vec::with_capacity(events.len()),
            tags: Vec::with_capacity(events.len()),
            text: Vec::with_capacity(events.len()),
            row_count: events.len(),
        };
        for event in events {
            frame.time.push(event.time);
            frame.title.push(event.title);
            frame.tags.push(event.tags);
            frame.text.push(event.text);
        }
        frame
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

/// Parse, look up and shape one annotation query
pub fn execute_annotation_query<L: AlarmLister + ?Sized>(
    lister: &L,
    raw: &RawQueryDocument,
    ref_id: &str,
    range: &TimeRange,
    ctx: &NormalizeContext,
) -> Result<AnnotationFrame, AnnotationError> {
    let query = AnnotationQuery::parse(raw, range, ctx)?;
    let events = AnnotationAssembler::new(lister, ctx.settings.max_alarm_records)
        .assemble(&query, range)?;
    Ok(AnnotationFrame::from_events(ref_id, events))
}
