//! Query normalization: raw document → `ResolvedQuery`.
//!
//! Stops at the first problem within a query. Across a batch every query is
//! judged on its own, so one malformed query never sinks its siblings.

use crate::identifier::{generate_id, resolve_id};
use crate::migration::migrate_query;
use crate::period::{resolve_period, PeriodRequest};
use crate::raw::{RawQuery, RawQueryDocument};
use metriq_core::{
    ApiMode, MetricEditorMode, MetricQueryType, NormalizeContext, ParseError, QueryError,
    ResolvedQuery, TimeRange, ValidationError,
};
use std::collections::HashSet;

/// Outcome of normalizing one query of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub ref_id: String,
    pub result: Result<ResolvedQuery, QueryError>,
}

impl QueryOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Normalize one raw document
pub fn normalize(
    raw: &RawQueryDocument,
    ref_id: &str,
    range: &TimeRange,
    ctx: &NormalizeContext,
) -> Result<ResolvedQuery, QueryError> {
    let settings = &ctx.settings;

    let dimensions = raw.normalized_dimensions()?;
    let statistic = raw.resolved_statistic()?;

    let requested = PeriodRequest::decode(raw.period.as_ref())?.or_auto();
    let period = resolve_period(requested, range, ctx.now);

    let id = resolve_id(raw.id(), ref_id, settings.max_id_length)?;

    let expression = raw.expression().to_string();
    let sql_expression = raw.sql_expression().to_string();
    let metric_query_type = resolve_query_type(raw, &sql_expression)?;
    let active_expression = match metric_query_type {
        MetricQueryType::Search => &expression,
        MetricQueryType::Query => &sql_expression,
    };
    let metric_editor_mode = resolve_editor_mode(raw, active_expression)?;
    let api_mode = ApiMode::derive(metric_query_type, metric_editor_mode, active_expression);

    Ok(ResolvedQuery {
        ref_id: ref_id.to_string(),
        id,
        region: settings.region_or_default(raw.region()),
        namespace: raw.namespace().to_string(),
        metric_name: raw.metric_name().to_string(),
        dimensions,
        statistic,
        period,
        expression,
        sql_expression,
        metric_query_type,
        metric_editor_mode,
        api_mode,
        match_exact: raw.match_exact.unwrap_or(true),
        alias: raw.alias().to_string(),
        label: raw.label().to_string(),
        return_data: !raw.hide.unwrap_or(false),
    })
}

/// Explicit type wins; otherwise a non-empty SQL expression implies `Query`
fn resolve_query_type(
    raw: &RawQueryDocument,
    sql_expression: &str,
) -> Result<MetricQueryType, ParseError> {
    match raw.metric_query_type {
        Some(code) => MetricQueryType::from_code(code)
            .ok_or_else(|| ParseError::Malformed(format!("metricQueryType: unknown value {}", code))),
        None if !sql_expression.is_empty() => Ok(MetricQueryType::Query),
        None => Ok(MetricQueryType::Search),
    }
}

/// A query carrying its expression is raw whatever the hint says
fn resolve_editor_mode(
    raw: &RawQueryDocument,
    active_expression: &str,
) -> Result<MetricEditorMode, ParseError> {
    let hinted = match raw.metric_editor_mode {
        Some(code) => MetricEditorMode::from_code(code).ok_or_else(|| {
            ParseError::Malformed(format!("metricEditorMode: unknown value {}", code))
        })?,
        None => MetricEditorMode::Builder,
    };
    if !active_expression.is_empty() {
        return Ok(MetricEditorMode::Raw);
    }
    Ok(hinted)
}

/// Normalizes queries against one request's context
#[derive(Debug, Clone)]
pub struct Normalizer {
    ctx: NormalizeContext,
}

impl Normalizer {
    pub fn new(ctx: NormalizeContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &NormalizeContext {
        &self.ctx
    }

    pub fn normalize(
        &self,
        raw: &RawQueryDocument,
        ref_id: &str,
        range: &TimeRange,
    ) -> Result<ResolvedQuery, QueryError> {
        normalize(raw, ref_id, range, &self.ctx)
    }

    /// Normalize a batch, one outcome per query in input order.
    ///
    /// Explicit ids are reserved first. A derived or generated id that
    /// clashes with any id already in the batch is regenerated, so only two
    /// queries naming the same explicit id conflict; the later one fails with
    /// `DuplicateId`.
    pub fn normalize_batch(&self, queries: &[RawQuery], range: &TimeRange) -> Vec<QueryOutcome> {
        let documents: Vec<_> = queries.iter().map(RawQuery::document).collect();
        let explicit: HashSet<String> = documents
            .iter()
            .filter_map(|doc| doc.as_ref().ok())
            .map(|doc| doc.id())
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();
        let mut claimed: HashSet<String> = HashSet::new();

        queries
            .iter()
            .zip(documents)
            .map(|(query, document)| {
                let result = document.map_err(QueryError::from).and_then(|doc| {
                    let mut resolved = self.normalize(&doc, &query.ref_id, range)?;
                    if !doc.id().is_empty() {
                        if !claimed.insert(resolved.id.clone()) {
                            return Err(ValidationError::DuplicateId { id: resolved.id }.into());
                        }
                        return Ok(resolved);
                    }
                    while explicit.contains(&resolved.id) || claimed.contains(&resolved.id) {
                        let fresh = generate_id(self.ctx.settings.max_id_length);
                        tracing::debug!(
                            ref_id = %query.ref_id,
                            taken = %resolved.id,
                            id = %fresh,
                            "derived id already used in batch, regenerated"
                        );
                        resolved.id = fresh;
                    }
                    claimed.insert(resolved.id.clone());
                    Ok(resolved)
                });
                if let Err(err) = &result {
                    tracing::warn!(ref_id = %query.ref_id, error = %err, "query normalization failed");
                }
                QueryOutcome {
                    ref_id: query.ref_id.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Run legacy migration (gated by the dynamic-labels setting), then normalize
    pub fn migrate_and_normalize(&self, queries: &[RawQuery], range: &TimeRange) -> Vec<QueryOutcome> {
        let dynamic_labels = self.ctx.settings.dynamic_labels;
        let mut outcomes = Vec::with_capacity(queries.len());
        let mut migrated = Vec::with_capacity(queries.len());
        let mut slots = Vec::with_capacity(queries.len());

        for query in queries {
            match migrate_query(query, dynamic_labels) {
                Ok(query) => {
                    slots.push(None);
                    migrated.push(query);
                }
                Err(err) => slots.push(Some(QueryOutcome {
                    ref_id: query.ref_id.clone(),
                    result: Err(err.into()),
                })),
            }
        }

        let mut normalized = self.normalize_batch(&migrated, range).into_iter();
        for slot in slots {
            match slot {
                Some(failed) => outcomes.push(failed),
                None => {
                    if let Some(outcome) = normalized.next() {
                        outcomes.push(outcome);
                    }
                }
            }
        }

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::debug!(total = outcomes.len(), failed, "normalized query batch");
        outcomes
    }
}
