//! Data types used by the correlation pipeline.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Closed taxonomy of relationship labels written to `correlation_flag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Pearson and Spearman agree and both are non-trivially strong.
    Stable,
    /// Measures roughly agree but at least one is weak.
    ConsistentWeaker,
    /// Measures diverge in magnitude.
    NonlinearOrOutliers,
    /// Measures disagree in sign.
    Unreliable,
    /// Too few samples, no significance, or constant input.
    Inconclusive,
}

impl Classification {
    pub const ALL: [Classification; 5] = [
        Classification::Stable,
        Classification::ConsistentWeaker,
        Classification::NonlinearOrOutliers,
        Classification::Unreliable,
        Classification::Inconclusive,
    ];

    /// The label as stored in `correlation_flag.corrflag_desc`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Stable => "STABLE",
            Classification::ConsistentWeaker => "CONSISTENT_WEAKER",
            Classification::NonlinearOrOutliers => "NONLINEAR_OR_OUTLIERS",
            Classification::Unreliable => "UNRELIABLE",
            Classification::Inconclusive => "INCONCLUSIVE",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Classification::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// Which sample-size and significance thresholds apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeriodKind {
    Weekly,
    Monthly,
}

impl PeriodKind {
    /// Labels starting with `WEEK` (any case) are weekly; everything else is monthly.
    pub fn from_label(label: &str) -> Self {
        if label.to_ascii_uppercase().starts_with("WEEK") {
            PeriodKind::Weekly
        } else {
            PeriodKind::Monthly
        }
    }
}

/// Two-sided p-values for both coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Significance {
    pub p_pearson: f64,
    pub p_spearman: f64,
}

/// Thresholds selection for [`classify`](crate::correlation::classify::classify).
///
/// `period: None` is the legacy path: a flat sample gate of 12 regardless of
/// window length. The significance gate only runs when `significance` is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassifyConfig {
    pub period: Option<PeriodKind>,
    pub significance: Option<Significance>,
    pub alpha: Option<f64>,
}

impl ClassifyConfig {
    pub fn legacy() -> Self {
        Self::default()
    }

    pub fn for_period(kind: PeriodKind) -> Self {
        Self {
            period: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_significance(mut self, p_pearson: f64, p_spearman: f64) -> Self {
        self.significance = Some(Significance {
            p_pearson,
            p_spearman,
        });
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }
}

/// City-wide daily averages for one metric on one calendar day.
///
/// Either side is `None` when no observation exists for that day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregateRow {
    pub metric_id: i64,
    pub observation_date: NaiveDate,
    pub weather_value: Option<f64>,
    pub pollutant_value: Option<f64>,
}

/// An inclusive date range tagged with its period label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period_label: String,
    pub processing_date: NaiveDate,
}

impl Window {
    /// `WEEK_<start>_<end>` with ISO dates.
    pub fn week(start: NaiveDate, end: NaiveDate, processing_date: NaiveDate) -> Self {
        Self {
            start,
            end,
            period_label: format!("WEEK_{}_{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")),
            processing_date,
        }
    }

    /// `MONTH_<YYYYMM>` of the window start.
    pub fn month(start: NaiveDate, end: NaiveDate, processing_date: NaiveDate) -> Self {
        Self {
            start,
            end,
            period_label: format!("MONTH_{}", start.format("%Y%m")),
            processing_date,
        }
    }

    pub fn kind(&self) -> PeriodKind {
        PeriodKind::from_label(&self.period_label)
    }
}

/// One persisted row of `correlation_result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub location_id: i64,
    pub metric_id: i64,
    pub period_label: String,
    pub processing_date: NaiveDate,
    pub classification: Classification,
    pub sample_count: usize,
}
