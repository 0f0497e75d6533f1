use crate::correlation::types::{Classification, ClassifyConfig, PeriodKind};

/// Minimum pairs for a weekly window.
pub const MIN_N_WEEKLY: usize = 5;
/// Minimum pairs for monthly windows and the legacy path.
pub const MIN_N_DEFAULT: usize = 12;

pub const ALPHA_WEEKLY: f64 = 0.20;
pub const ALPHA_DEFAULT: f64 = 0.10;

/// `abs(r - rho)` below which the coefficients agree.
const STABLE_DELTA: f64 = 0.20;
const STABLE_MIN_ABS: f64 = 0.30;
const CONSISTENT_DELTA: f64 = 0.40;

/// Sample-size gate for a period kind; `None` is the legacy flat gate.
pub fn min_samples(period: Option<PeriodKind>) -> usize {
    match period {
        Some(PeriodKind::Weekly) => MIN_N_WEEKLY,
        Some(PeriodKind::Monthly) | None => MIN_N_DEFAULT,
    }
}

/// Significance threshold used when the config does not override it.
pub fn default_alpha(period: Option<PeriodKind>) -> f64 {
    match period {
        Some(PeriodKind::Weekly) => ALPHA_WEEKLY,
        Some(PeriodKind::Monthly) | None => ALPHA_DEFAULT,
    }
}

/// Classifies the relationship described by a Pearson/Spearman pair.
///
/// Gates are checked in order, `delta` is `abs(r - rho)`:
///
/// | Gate                                      | Label                   |
/// |-------------------------------------------|-------------------------|
/// | `n` below the period's minimum            | `INCONCLUSIVE`          |
/// | signs differ                              | `UNRELIABLE`            |
/// | both p-values `>= alpha` (when supplied)  | `INCONCLUSIVE`          |
/// | `delta < 0.20`, weaker coefficient `>= 0.30` | `STABLE`             |
/// | `delta < 0.40`                            | `CONSISTENT_WEAKER`     |
/// | otherwise                                 | `NONLINEAR_OR_OUTLIERS` |
pub fn classify(
    pearson_r: f64,
    spearman_rho: f64,
    n_obs: usize,
    config: &ClassifyConfig,
) -> Classification {
    let alpha = config.alpha.unwrap_or_else(|| default_alpha(config.period));

    if n_obs < min_samples(config.period) {
        return Classification::Inconclusive;
    }

    // NaN compares unequal to everything, so a NaN coefficient lands here too
    if sign(pearson_r) != sign(spearman_rho) {
        return Classification::Unreliable;
    }

    if let Some(sig) = config.significance {
        if sig.p_pearson >= alpha && sig.p_spearman >= alpha {
            return Classification::Inconclusive;
        }
    }

    let delta = (pearson_r - spearman_rho).abs();
    let min_abs = pearson_r.abs().min(spearman_rho.abs());

    match delta {
        d if d < STABLE_DELTA && min_abs >= STABLE_MIN_ABS => Classification::Stable,
        d if d < CONSISTENT_DELTA => Classification::ConsistentWeaker,
        _ => Classification::NonlinearOrOutliers,
    }
}

/// -1, 0 or 1; NaN stays NaN.
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}
