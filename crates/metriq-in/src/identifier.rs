//! Metric-data identifier resolution.
//!
//! The remote API wants every query id to start with a letter and contain
//! only letters, digits and underscores, up to a bounded length.

use lazy_static::lazy_static;
use metriq_core::ParseError;
use regex::Regex;
use uuid::Uuid;

lazy_static! {
    static ref METRIC_DATA_ID: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap();
}

/// Prefix keeping derived ids clear of short user-chosen ones like `a` or `b`
pub const ID_PREFIX: &str = "query";

/// Check the identifier-safety pattern and length bound
pub fn is_valid_metric_data_id(id: &str, max_len: usize) -> bool {
    id.len() <= max_len && METRIC_DATA_ID.is_match(id)
}

/// Pick the execution-scope id for a query.
///
/// An explicit id is kept as written, but only when it is itself valid: an
/// unsafe explicit id fails with `InvalidId` instead of passing through to
/// the remote API. Otherwise the id is `query` + `ref_id` when that is safe,
/// or a fresh random one within `max_len`.
pub fn resolve_id(explicit: &str, ref_id: &str, max_len: usize) -> Result<String, ParseError> {
    if !explicit.is_empty() {
        if !is_valid_metric_data_id(explicit, max_len) {
            return Err(ParseError::InvalidId {
                id: explicit.to_string(),
            });
        }
        return Ok(explicit.to_string());
    }

    let derived = format!("{}{}", ID_PREFIX, ref_id);
    if METRIC_DATA_ID.is_match(ref_id) && derived.len() <= max_len {
        return Ok(derived);
    }

    let generated = generate_id(max_len);
    tracing::debug!(ref_id, id = %generated, "refId is not identifier-safe, generated id");
    Ok(generated)
}

/// Random identifier no longer than `max_len`.
///
/// The uuid suffix is cut to fit, so the random namespace shrinks with the
/// bound; settings keep `max_len` at or above `MIN_ID_LENGTH`.
pub fn generate_id(max_len: usize) -> String {
    let mut suffix = Uuid::new_v4().simple().to_string();
    suffix.truncate(max_len.saturating_sub(ID_PREFIX.len()));
    format!("{}{}", ID_PREFIX, suffix)
}
