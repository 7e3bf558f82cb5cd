//! Metriq Alarms: alarm matching and annotation assembly
//!
//! Narrows a broad alarm listing down to the alarms of one metric series and
//! flattens their state-change history into annotation events.

pub mod annotations;
pub mod matcher;

pub use annotations::{
    execute_annotation_query, AnnotationAssembler, AnnotationError, AnnotationFrame,
    AnnotationQuery,
};
pub use matcher::{match_alarms, MatchCriteria};
