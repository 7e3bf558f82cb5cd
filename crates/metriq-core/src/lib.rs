//! Metriq Core: canonical query model, error taxonomy and collaborator seams
//!
//! Everything downstream of the parsing boundary speaks these types. The raw,
//! loosely-typed request documents never leave `metriq-in`.

pub mod collaborators;
pub mod context;
pub mod data_model;
pub mod error;

pub use collaborators::{AlarmFilter, AlarmLister, TimeSeriesFetcher};
pub use context::{NormalizeContext, NormalizerSettings};
pub use data_model::{
    AlarmHistoryItem, AlarmRecord, AnnotationEvent, ApiMode, Dimensions, MetricEditorMode,
    MetricQueryType, ResolvedQuery, Sample, TimeRange,
};
pub use error::{ParseError, QueryError, SettingsError, TransportError, ValidationError};

/// Engine version
pub const METRIQ_VERSION: &str = "1.0.0";

/// Period applied when neither the caller nor the auto resolver picks one
pub const DEFAULT_PERIOD_SECONDS: i64 = 300;

/// Longest metric-data identifier the remote API accepts
pub const MAX_ID_LENGTH: usize = 255;

/// Smallest `maxIdLength` leaving room for the `query` prefix plus 64 random bits
pub const MIN_ID_LENGTH: usize = 21;

/// Page size for alarm discovery and history requests
pub const DEFAULT_MAX_ALARM_RECORDS: i64 = 100;
