//! Correlation statistics and relationship classification.
//!
//! [`stats`] computes Pearson and Spearman coefficients with p-values,
//! [`classify`] maps a coefficient pair onto the [`Classification`] taxonomy.

pub mod classify;
pub mod stats;
pub mod types;

pub use classify::classify;
pub use types::{
    Classification, ClassificationResult, ClassifyConfig, DailyAggregateRow, PeriodKind,
    Significance, Window,
};
