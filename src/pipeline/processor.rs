//! Correlates every active metric over one window and persists the labels.

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use crate::correlation::stats::{self, Correlation, is_constant};
use crate::correlation::{
    Classification, ClassificationResult, ClassifyConfig, DailyAggregateRow, PeriodKind, Window,
    classify,
};
use crate::error::{CorrelationError, Result, StoreError};
use crate::store::{CorrelationStore, WindowScope};

/// Outcome of correlating one metric's finite pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub classification: Classification,
    pub sample_count: usize,
    /// `None` when the input was constant and no coefficient was computed.
    pub pearson: Option<Correlation>,
    pub spearman: Option<Correlation>,
}

/// Splits rows into parallel weather/pollutant series, dropping any day where
/// either side is missing or non-finite.
pub fn finite_pairs(rows: &[DailyAggregateRow]) -> (Vec<f64>, Vec<f64>) {
    rows.iter()
        .filter_map(|r| match (r.weather_value, r.pollutant_value) {
            (Some(w), Some(p)) if w.is_finite() && p.is_finite() => Some((w, p)),
            _ => None,
        })
        .unzip()
}

/// Correlates `weather` against `pollutant` and classifies the result.
///
/// Constant input on either side is `INCONCLUSIVE` without computing any
/// coefficient.
///
/// # Errors
///
/// Fewer than two pairs, mismatched lengths, or a failed p-value computation.
pub fn assess(
    weather: &[f64],
    pollutant: &[f64],
    kind: PeriodKind,
) -> std::result::Result<Assessment, CorrelationError> {
    if weather.len() != pollutant.len() {
        return Err(CorrelationError::LengthMismatch {
            left: weather.len(),
            right: pollutant.len(),
        });
    }
    let n = weather.len();
    if n < 2 {
        return Err(CorrelationError::TooFewPairs(n));
    }

    if is_constant(weather) || is_constant(pollutant) {
        return Ok(Assessment {
            classification: Classification::Inconclusive,
            sample_count: n,
            pearson: None,
            spearman: None,
        });
    }

    let pearson = stats::pearson(weather, pollutant)?;
    let spearman = stats::spearman(weather, pollutant)?;

    let config = ClassifyConfig::for_period(kind)
        .with_significance(pearson.p_value, spearman.p_value);
    let classification = classify(pearson.coefficient, spearman.coefficient, n, &config);

    Ok(Assessment {
        classification,
        sample_count: n,
        pearson: Some(pearson),
        spearman: Some(spearman),
    })
}

/// Groups rows by metric id; each group is sorted by date.
fn group_by_metric(rows: Vec<DailyAggregateRow>) -> BTreeMap<i64, Vec<DailyAggregateRow>> {
    let mut groups: BTreeMap<i64, Vec<DailyAggregateRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.metric_id).or_default().push(row);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|r| r.observation_date);
    }
    groups
}

/// Signature of [`assess`], the per-metric step of [`WindowProcessor`].
pub type Assessor =
    fn(&[f64], &[f64], PeriodKind) -> std::result::Result<Assessment, CorrelationError>;

/// Processes windows for one city, writing results under one location id.
#[derive(Debug, Clone, Copy)]
pub struct WindowProcessor {
    pub city_id: i64,
    pub location_id: i64,
    assessor: Assessor,
}

impl WindowProcessor {
    pub fn new(city_id: i64, location_id: i64) -> Self {
        Self {
            city_id,
            location_id,
            assessor: assess,
        }
    }

    /// Replaces [`assess`] for every metric.
    pub fn with_assessor(mut self, assessor: Assessor) -> Self {
        self.assessor = assessor;
        self
    }

    /// Correlates every active metric over `window` and commits the results
    /// once. Returns the number of result rows written.
    ///
    /// An empty window returns 0 without committing. Metrics with fewer than
    /// two finite pairs, a failed correlation, or an unknown label are skipped.
    /// Any other store error aborts the window and rolls back everything
    /// written for it.
    #[tracing::instrument(
        skip(self, store, window),
        fields(period = %window.period_label, start = %window.start, end = %window.end)
    )]
    pub fn process_range<S: CorrelationStore>(
        &self,
        store: &mut S,
        window: &Window,
    ) -> Result<usize> {
        info!("Processing range");

        let mut scope = store.begin()?;
        let rows = scope.fetch_daily_aggregates(window.start, window.end, self.city_id)?;
        if rows.is_empty() {
            warn!("No rows found for period");
            return Ok(0);
        }

        let kind = window.kind();
        let mut inserted = 0;

        for (metric_id, group) in group_by_metric(rows) {
            let (weather, pollutant) = finite_pairs(&group);
            if weather.len() < 2 {
                debug!(metric_id, n = weather.len(), "Too few finite pairs, skipping metric");
                continue;
            }

            let assessment = match (self.assessor)(&weather, &pollutant, kind) {
                Ok(a) => a,
                Err(e) => {
                    error!(metric_id, error = %e, "Correlation error");
                    continue;
                }
            };

            debug!(
                metric_id,
                n = assessment.sample_count,
                pearson_r = assessment.pearson.map(|c| c.coefficient),
                spearman_rho = assessment.spearman.map(|c| c.coefficient),
                classification = %assessment.classification,
                "Metric classified"
            );

            let result = ClassificationResult {
                location_id: self.location_id,
                metric_id,
                period_label: window.period_label.clone(),
                processing_date: window.processing_date,
                classification: assessment.classification,
                sample_count: assessment.sample_count,
            };

            match scope.insert_classification_result(&result) {
                Ok(()) => inserted += 1,
                Err(StoreError::UnknownLabel(label)) => {
                    warn!(
                        metric_id,
                        label = %label,
                        "Unknown classification label, skipping metric"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        scope.commit()?;
        info!(inserted, "Inserted correlation_result rows");
        Ok(inserted)
    }
}
