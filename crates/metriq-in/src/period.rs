//! Period resolution: turns a requested sampling interval into seconds.
//!
//! "auto" combines two lookups:
//! - a range tier, the finest resolution keeping the window under
//!   `MAX_DATAPOINTS` samples
//! - an age floor, the finest resolution the remote store still retains
//!   for data as old as the start of the window
//!
//! The resolved period is the larger of the two.

use chrono::{DateTime, Duration, Utc};
use metriq_core::{ParseError, TimeRange, DEFAULT_PERIOD_SECONDS};
use serde_json::Value;

/// Resolutions the remote store serves, finest first
pub const RESOLUTIONS: [i64; 6] = [60, 300, 900, 3_600, 21_600, 86_400];

/// Upper bound on samples per series the range tier aims for
pub const MAX_DATAPOINTS: i64 = 2_000;

/// Retention steps as (minimum age in days, coarsest-still-available floor)
const RETENTION_FLOORS: [(i64, i64); 3] = [(455, 21_600), (63, 3_600), (15, 300)];

/// A requested period, decoded once at the parsing boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRequest {
    Auto,
    Explicit(i64),
    Unset,
}

impl PeriodRequest {
    /// Decode the raw `period` field (string, number, or absent)
    pub fn decode(value: Option<&Value>) -> Result<Self, ParseError> {
        match value {
            None | Some(Value::Null) => Ok(PeriodRequest::Unset),
            Some(Value::String(s)) => Self::parse(s),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(seconds) => Self::from_seconds(seconds, &n.to_string()),
                None => Err(invalid(&n.to_string())),
            },
            Some(other) => Err(invalid(&other.to_string())),
        }
    }

    /// Parse the textual form: "", "auto", or base-10 seconds
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(PeriodRequest::Unset);
        }
        if trimmed == "auto" {
            return Ok(PeriodRequest::Auto);
        }
        let seconds: i64 = trimmed.parse().map_err(|_| invalid(raw))?;
        Self::from_seconds(seconds, raw)
    }

    fn from_seconds(seconds: i64, raw: &str) -> Result<Self, ParseError> {
        match seconds {
            0 => Ok(PeriodRequest::Unset),
            s if s > 0 => Ok(PeriodRequest::Explicit(s)),
            _ => Err(invalid(raw)),
        }
    }

    /// Metric queries treat an unset period as "auto"
    pub fn or_auto(self) -> Self {
        match self {
            PeriodRequest::Unset => PeriodRequest::Auto,
            other => other,
        }
    }
}

fn invalid(raw: &str) -> ParseError {
    ParseError::InvalidPeriod {
        value: raw.to_string(),
    }
}

/// Resolve a requested period to seconds.
///
/// Explicit periods pass through untouched; no retention floor is applied
/// to them. `now` is the reference instant the window's age is measured
/// against.
pub fn resolve_period(requested: PeriodRequest, range: &TimeRange, now: DateTime<Utc>) -> i64 {
    match requested {
        PeriodRequest::Explicit(seconds) => seconds,
        PeriodRequest::Unset => DEFAULT_PERIOD_SECONDS,
        PeriodRequest::Auto => auto_period(range, now),
    }
}

/// `max(range tier, age floor)`
pub fn auto_period(range: &TimeRange, now: DateTime<Utc>) -> i64 {
    let tier = range_tier(range.duration());
    match age_floor(now - range.from) {
        Some(floor) => tier.max(floor),
        None => tier,
    }
}

/// Finest resolution that keeps `window` within `MAX_DATAPOINTS` samples
pub fn range_tier(window: Duration) -> i64 {
    let seconds = window.num_seconds();
    // ceil(seconds / MAX_DATAPOINTS), non-positive windows land on the finest tier
    let datapoints = if seconds <= 0 {
        0
    } else {
        (seconds + MAX_DATAPOINTS - 1) / MAX_DATAPOINTS
    };
    RESOLUTIONS
        .iter()
        .copied()
        .find(|&resolution| datapoints <= resolution)
        .unwrap_or(RESOLUTIONS[RESOLUTIONS.len() - 1])
}

/// Coarsest resolution forced by data age, `None` while every resolution is retained
pub fn age_floor(age: Duration) -> Option<i64> {
    RETENTION_FLOORS
        .iter()
        .find(|(days, _)| age > Duration::days(*days))
        .map(|(_, floor)| *floor)
}
