//! Normalize Context: settings plus the reference instant shared by a request
use crate::error::SettingsError;
use crate::{DEFAULT_MAX_ALARM_RECORDS, DEFAULT_PERIOD_SECONDS, MAX_ID_LENGTH, MIN_ID_LENGTH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tunables for normalization and annotation assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizerSettings {
    /// Migrate legacy aliases into dynamic labels
    pub dynamic_labels: bool,
    /// Region used when a query names none (or the literal "default")
    pub default_region: String,
    pub max_id_length: usize,
    pub default_period: i64,
    pub max_alarm_records: i64,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            dynamic_labels: false,
            default_region: "us-east-1".to_string(),
            max_id_length: MAX_ID_LENGTH,
            default_period: DEFAULT_PERIOD_SECONDS,
            max_alarm_records: DEFAULT_MAX_ALARM_RECORDS,
        }
    }
}

impl NormalizerSettings {
    /// Load settings from a YAML file
    pub fn load(path: &str) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML content; absent keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        let settings: NormalizerSettings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        tracing::debug!(?settings, "loaded normalizer settings");
        Ok(settings)
    }

    /// Reject bounds no generated identifier could satisfy
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_id_length < MIN_ID_LENGTH {
            return Err(SettingsError::Invalid {
                field: "maxIdLength",
                reason: format!(
                    "{} is below the minimum of {}",
                    self.max_id_length, MIN_ID_LENGTH
                ),
            });
        }
        Ok(())
    }

    /// Resolve a query's region against the configured default
    pub fn region_or_default(&self, region: &str) -> String {
        if region.is_empty() || region == "default" {
            self.default_region.clone()
        } else {
            region.to_string()
        }
    }
}

/// Per-request state threaded through normalization
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Reference instant standing in for "now" in age computations
    pub now: DateTime<Utc>,
    pub settings: NormalizerSettings,
}

impl NormalizeContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            settings: NormalizerSettings::default(),
        }
    }

    /// Context pinned to the current wall clock
    pub fn at_wall_clock() -> Self {
        Self::new(Utc::now())
    }

    pub fn with_settings(mut self, settings: NormalizerSettings) -> Self {
        self.settings = settings;
        self
    }
}
