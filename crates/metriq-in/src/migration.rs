//! Legacy query migration, applied to raw documents before normalization.
//!
//! Rewrites each document in place: plural statistics collapse to one, and
//! the alias is copied into a dynamic label when the gate allows it.

use crate::labels::{migrate_alias, should_migrate};
use crate::raw::{RawQuery, RawQueryDocument, StatisticField};
use metriq_core::ParseError;
use serde_json::Value;

/// Migrate one document in place
pub fn migrate_document(doc: &mut RawQueryDocument, dynamic_labels: bool) -> Result<(), ParseError> {
    migrate_statistics(doc)?;

    if should_migrate(doc.label(), dynamic_labels) {
        let label = migrate_alias(doc.alias());
        tracing::debug!(alias = doc.alias(), %label, "migrated alias to dynamic label");
        doc.label = Some(label);
    }
    Ok(())
}

/// Collapse `statistics: [..]` (or a list-valued `statistic`) to its first entry
fn migrate_statistics(doc: &mut RawQueryDocument) -> Result<(), ParseError> {
    let source = match (doc.statistic.take(), doc.statistics.take()) {
        (Some(Value::String(s)), _) => {
            doc.statistic = Some(Value::String(s));
            return Ok(());
        }
        (Some(value), _) if !value.is_null() => value,
        (_, Some(value)) if !value.is_null() => value,
        _ => return Ok(()),
    };
    let first = StatisticField::from_json(&source)?.into_first();
    doc.statistic = Some(Value::String(first));
    Ok(())
}

/// Migrate a single raw query, returning the rewritten query
pub fn migrate_query(query: &RawQuery, dynamic_labels: bool) -> Result<RawQuery, ParseError> {
    let mut doc = query.document()?;
    migrate_document(&mut doc, dynamic_labels)?;
    Ok(RawQuery::new(query.ref_id.clone(), doc.to_value()?))
}

/// Migrate a batch; each query succeeds or fails on its own
pub fn migrate_legacy_queries(
    queries: &[RawQuery],
    dynamic_labels: bool,
) -> Vec<Result<RawQuery, ParseError>> {
    queries
        .iter()
        .map(|query| {
            migrate_query(query, dynamic_labels).map_err(|err| {
                tracing::warn!(ref_id = %query.ref_id, error = %err, "legacy migration failed");
                err
            })
        })
        .collect()
}
