use crate::model::{
    config::{RatingTable, ScoutingFormula},
    structures::{
        rating_result::{RatingResult, STAR_FLOOR},
        scouting_grade::clamp_grade
    }
};

/// Star rating for `percentile`: the first threshold the percentile reaches wins.
pub fn percentile_to_rating(percentile: f64, table: &RatingTable) -> f64 {
    table
        .thresholds
        .iter()
        .find(|t| percentile >= t.min_percentile)
        .map(|t| t.rating)
        .unwrap_or(STAR_FLOOR)
}

pub fn rating_result(percentile: f64, table: &RatingTable) -> RatingResult {
    RatingResult::new(percentile, percentile_to_rating(percentile, table))
}

/// Grade on the 20–80 scale whose scouting-expected rate is `rate`.
pub fn rate_to_grade(rate: f64, formula: &ScoutingFormula) -> f64 {
    clamp_grade(formula.grade(rate))
}

/// Scouting-expected MLB rate for a grade; the grade is clamped to 20–80 first.
pub fn grade_to_rate(grade: f64, formula: &ScoutingFormula) -> f64 {
    formula.rate(clamp_grade(grade))
}
