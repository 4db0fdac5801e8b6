use serde::{Deserialize, Serialize};

/// Lowest and highest values of the half-step star scale.
pub const STAR_FLOOR: f64 = 0.5;
pub const STAR_CEILING: f64 = 5.0;

/// A percentile (fraction of the reference population this player is better
/// than) together with its discrete star rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResult {
    pub percentile: f64,
    pub rating: f64
}

impl RatingResult {
    pub fn new(percentile: f64, rating: f64) -> RatingResult {
        RatingResult {
            percentile: percentile.clamp(0.0, 100.0),
            rating: rating.clamp(STAR_FLOOR, STAR_CEILING)
        }
    }

    /// Caps a current-ability result at the ceiling result for the same skill.
    pub fn capped_at(self, ceiling: &RatingResult) -> RatingResult {
        RatingResult {
            percentile: self.percentile.min(ceiling.percentile),
            rating: self.rating.min(ceiling.rating)
        }
    }
}
