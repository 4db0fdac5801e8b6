//! Current ability for players still developing toward their ceiling.
//!
//! A player is placed in the cohort of historical players who peaked where his
//! projection peaks. The cohort's age curve says how far along that group was
//! at his age, which places a baseline between the scale floor and his
//! ceiling. His own observed rate then nudges the baseline up or down, shrunk
//! by how much sample stands behind it.

use crate::model::{
    blender::ObservedSample,
    config::{DevelopmentCohort, EngineConfig},
    structures::{component::Component, scouting_grade::GRADE_FLOOR}
};

/// What the development curve needs to know about one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevelopmentInput {
    pub component: Component,
    /// Ceiling grade on the 20–80 scale
    pub ceiling: f64,
    /// Projected peak rate, used to pick the cohort
    pub peak_rate: f64,
    /// Unadjusted observed rate and its sample, if any
    pub observed: Option<ObservedSample>
}

/// The cohort whose peak range holds `peak_rate`, or the nearest one.
pub fn select_cohort(cohorts: &[DevelopmentCohort], peak_rate: f64) -> Option<&DevelopmentCohort> {
    if !peak_rate.is_finite() {
        return None;
    }

    if let Some(cohort) = cohorts
        .iter()
        .find(|c| peak_rate >= c.peak_min && peak_rate < c.peak_max)
    {
        return Some(cohort);
    }

    cohorts.iter().min_by(|a, b| {
        let distance = |c: &DevelopmentCohort| {
            if peak_rate < c.peak_min {
                c.peak_min - peak_rate
            } else if peak_rate >= c.peak_max {
                peak_rate - c.peak_max
            } else {
                0.0
            }
        };

        distance(a).total_cmp(&distance(b))
    })
}

/// The cohort's expected rate at `age`, linear between curve points and flat
/// beyond either end.
pub fn expected_at(cohort: &DevelopmentCohort, age: f64) -> Option<f64> {
    let curve = &cohort.curve;
    let first = curve.first()?;
    let last = curve.last()?;

    if age <= first.age {
        return Some(first.value);
    }
    if age >= last.age {
        return Some(last.value);
    }

    let upper = curve.partition_point(|p| p.age <= age);
    let (a, b) = (curve[upper - 1], curve[upper]);
    let t = (age - a.age) / (b.age - a.age);

    Some(a.value + (b.value - a.value) * t)
}

/// How far along the cohort's curve `age` sits, 0 to 1.
///
/// For lower-is-better components the curve's values fall as players develop,
/// so the position is read from age rather than from value.
pub fn development_fraction(component: Component, cohort: &DevelopmentCohort, age: f64) -> f64 {
    let (Some(first), Some(last)) = (cohort.curve.first(), cohort.curve.last()) else {
        return 1.0;
    };

    let fraction = if component.higher_is_better() {
        let span = last.value - first.value;
        if span == 0.0 {
            return 1.0;
        }

        match expected_at(cohort, age) {
            Some(expected) => (expected - first.value) / span,
            None => 1.0
        }
    } else {
        let span = last.age - first.age;
        if span == 0.0 {
            return 1.0;
        }

        (age - first.age) / span
    };

    if fraction.is_nan() {
        return 1.0;
    }

    fraction.clamp(0.0, 1.0)
}

/// Rating points from the player's deviation against his cohort at `age`.
fn individual_adjustment(
    component: Component,
    cohort: &DevelopmentCohort,
    age: f64,
    observed: &ObservedSample,
    config: &EngineConfig
) -> f64 {
    let Some(expected) = expected_at(cohort, age) else {
        return 0.0;
    };
    if expected == 0.0 || !(observed.sample > 0.0) || !observed.rate.is_finite() {
        return 0.0;
    }

    let mut deviation = (observed.rate - expected) / expected;
    if !component.higher_is_better() {
        deviation = -deviation;
    }

    let bound = config.development.dispersion_bound * cohort.ratio_dispersion;
    let deviation = deviation.clamp(-bound, bound);

    let stabilization = config.component(component).stabilization;
    let shrinkage = observed.sample / (observed.sample + stabilization);

    deviation * shrinkage * config.development.sensitivity
}

fn baseline(ceiling: f64, fraction: f64) -> f64 {
    GRADE_FLOOR + (ceiling - GRADE_FLOOR) * fraction
}

fn clamp_to_ceiling(rating: f64, ceiling: f64) -> f64 {
    if rating.is_nan() {
        return GRADE_FLOOR;
    }

    rating.clamp(GRADE_FLOOR, ceiling)
}

fn sanitize_ceiling(ceiling: f64) -> f64 {
    if ceiling.is_nan() {
        GRADE_FLOOR
    } else {
        ceiling.max(GRADE_FLOOR)
    }
}

/// Current-ability grade for one component, always within `[20, ceiling]`.
///
/// Components without cohorts have no curve of their own and are treated as
/// fully developed here; [`develop_player`] substitutes the average fraction of
/// the player's other components instead.
pub fn current_ability_rating(
    component: Component,
    ceiling: f64,
    peak_rate: f64,
    age: f64,
    observed: Option<&ObservedSample>,
    config: &EngineConfig
) -> f64 {
    let ceiling = sanitize_ceiling(ceiling);
    let cohorts = &config.component(component).cohorts;

    let Some(cohort) = select_cohort(cohorts, peak_rate) else {
        return ceiling;
    };

    let mut rating = baseline(ceiling, development_fraction(component, cohort, age));
    if let Some(observed) = observed {
        rating += individual_adjustment(component, cohort, age, observed, config);
    }

    clamp_to_ceiling(rating, ceiling)
}

/// Current-ability grades for every component of one player.
pub fn develop_player(inputs: &[DevelopmentInput], age: f64, config: &EngineConfig) -> Vec<(Component, f64)> {
    let fractions: Vec<f64> = inputs
        .iter()
        .filter(|i| i.component.has_raw_equivalent())
        .filter_map(|i| {
            let cohorts = &config.component(i.component).cohorts;
            select_cohort(cohorts, i.peak_rate).map(|c| development_fraction(i.component, c, age))
        })
        .collect();

    let average_fraction = if fractions.is_empty() {
        1.0
    } else {
        fractions.iter().sum::<f64>() / fractions.len() as f64
    };

    inputs
        .iter()
        .map(|input| {
            let rating = if input.component.has_raw_equivalent() {
                current_ability_rating(
                    input.component,
                    input.ceiling,
                    input.peak_rate,
                    age,
                    input.observed.as_ref(),
                    config
                )
            } else {
                let ceiling = sanitize_ceiling(input.ceiling);
                clamp_to_ceiling(baseline(ceiling, average_fraction), ceiling)
            };

            (input.component, rating)
        })
        .collect()
}
