//! Alias → dynamic label migration.
//!
//! Legacy aliases use `{{ token }}` placeholders. Dynamic labels use
//! `${PROP('Name')}` and `${LABEL}`. The token set is closed: five reserved
//! property tokens, `label`, and everything else read as a dimension name.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref LEGACY_ALIAS_TOKEN: Regex = Regex::new(r"\{\{\s*(.+?)\s*\}\}").unwrap();
}

/// Placeholder emitted for a single alias token
fn placeholder_for(token: &str) -> String {
    match token {
        "metric" => "${PROP('MetricName')}".to_string(),
        "namespace" => "${PROP('Namespace')}".to_string(),
        "period" => "${PROP('Period')}".to_string(),
        "region" => "${PROP('Region')}".to_string(),
        "stat" => "${PROP('Stat')}".to_string(),
        "label" => "${LABEL}".to_string(),
        dimension => format!("${{PROP('Dim.{}')}}", dimension),
    }
}

/// Rewrite a legacy alias into a dynamic label template.
///
/// Text outside placeholders is kept byte for byte.
pub fn migrate_alias(alias: &str) -> String {
    LEGACY_ALIAS_TOKEN
        .replace_all(alias, |caps: &Captures| {
            let token = caps[1].trim();
            if token.is_empty() {
                caps[0].to_string()
            } else {
                placeholder_for(token)
            }
        })
        .into_owned()
}

/// Migrate only when the feature is on and the caller set no label
pub fn should_migrate(existing_label: &str, feature_enabled: bool) -> bool {
    feature_enabled && existing_label.is_empty()
}
