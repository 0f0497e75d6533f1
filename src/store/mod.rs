//! Observation source and result sink for the correlation pipeline.
//!
//! A [`CorrelationStore`] hands out one [`WindowScope`] per processed window.
//! Everything written through a scope becomes visible only after
//! [`WindowScope::commit`]; a scope dropped without committing rolls back.

pub mod sqlite;

pub use sqlite::SqliteStore;

use chrono::NaiveDate;

use crate::correlation::{ClassificationResult, DailyAggregateRow};
use crate::error::StoreError;

/// A transactional view of the store for a single window.
pub trait WindowScope {
    /// One row per (active metric, calendar day) in `[start, end]`.
    ///
    /// Days with an observation on either side anywhere in range are kept; values
    /// are city-wide daily averages for `city_id`, `None` when that side is missing.
    /// Rows are ordered by metric id then date.
    fn fetch_daily_aggregates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        city_id: i64,
    ) -> Result<Vec<DailyAggregateRow>, StoreError>;

    /// Writes one classification row.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownLabel`] when the label has no flag in the store.
    fn insert_classification_result(
        &mut self,
        result: &ClassificationResult,
    ) -> Result<(), StoreError>;

    fn commit(self) -> Result<(), StoreError>;
}

/// Opens [`WindowScope`]s.
pub trait CorrelationStore {
    type Scope<'a>: WindowScope
    where
        Self: 'a;

    fn begin(&mut self) -> Result<Self::Scope<'_>, StoreError>;
}
