use crate::model::structures::reference_distribution::ReferenceDistribution;
use tracing::warn;

const NEUTRAL_PERCENTILE: f64 = 50.0;

/// Share of the reference population `value` is better than, 0–100.
///
/// Counts the reference values `<= value` by binary search. For lower-is-better
/// metrics the share is inverted so a higher percentile always means better.
/// An empty distribution or a non-finite input is a caller bug; rather than
/// fail a whole aggregation it yields the neutral 50th percentile.
pub fn to_percentile(value: f64, distribution: &ReferenceDistribution) -> f64 {
    if distribution.is_empty() {
        warn!("Percentile requested against empty {} distribution", distribution.metric);
        return NEUTRAL_PERCENTILE;
    }

    if !value.is_finite() {
        warn!("Non-finite {} value passed to percentile mapper", distribution.metric);
        return NEUTRAL_PERCENTILE;
    }

    let values = distribution.values();
    let at_or_below = values.partition_point(|v| *v <= value);
    let share = at_or_below as f64 / values.len() as f64 * 100.0;

    if distribution.higher_is_better {
        share
    } else {
        100.0 - share
    }
}

/// The value sitting at `percentile` in the reference population.
///
/// Linear interpolation between the two order statistics bracketing
/// `percentile / 100 * (n - 1)`. `None` when the distribution is empty.
pub fn from_percentile(percentile: f64, distribution: &ReferenceDistribution) -> Option<f64> {
    let values = distribution.values();
    if values.is_empty() {
        warn!("Inverse percentile requested against empty {} distribution", distribution.metric);
        return None;
    }

    let mut percentile = if percentile.is_nan() {
        NEUTRAL_PERCENTILE
    } else {
        percentile.clamp(0.0, 100.0)
    };
    if !distribution.higher_is_better {
        percentile = 100.0 - percentile;
    }

    let position = percentile / 100.0 * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let t = position - lower as f64;

    Some(values[lower] + (values[upper] - values[lower]) * t)
}
