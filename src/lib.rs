//! Sales-transaction analytics core: map arbitrary spreadsheet headers onto
//! a canonical schema, coerce messy values, and turn the result into
//! metrics, narrated insights and recommendations.

pub mod config;
pub mod dedup;
pub mod detector;
pub mod error;
pub mod frames;
pub mod insights;
pub mod logging;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod quality;
pub mod recommendations;
pub mod schema;
pub mod table;
pub mod transaction;

#[cfg(feature = "python")]
mod python;

pub use config::AnalysisConfig;
pub use dedup::{deduplicate, Deduplicated};
pub use detector::{ColumnMapping, SchemaDetector};
pub use error::{JituError, Result};
pub use insights::{Insight, InsightCategory, InsightClassifier, Severity};
pub use metrics::{Granularity, MetricResult, MetricsEngine};
pub use normalizer::{FieldNormalizer, Normalized};
pub use pipeline::{analyze, build_report, prepare, AnalysisReport, PreparedData};
pub use recommendations::{recommend, Recommendation};
pub use schema::CanonicalField;
pub use table::{RawTable, RawValue};
pub use transaction::{Transaction, TransactionSet};
