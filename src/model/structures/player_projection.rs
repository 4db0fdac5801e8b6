use crate::model::structures::{
    component::Component, level::Level, player_type::PlayerType, rating_result::RatingResult
};
use serde::{Deserialize, Serialize};

/// One component's ceiling and present-day grade for a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRating {
    pub component: Component,
    /// Projected peak grade on the 20–80 scale
    pub ceiling: f64,
    /// Present-day grade on the 20–80 scale, never above `ceiling`
    pub current: f64,
    /// Blended peak rate (the component's metric)
    pub blended_rate: f64,
    /// Percentile of `blended_rate` against the reference population
    pub percentile: f64,
    pub scouting_weight: f64,
    /// Level-weighted sample behind the observed side of the blend
    pub sample: f64
}

/// Which evidence fed a player's ratings. Single-source ratings carry less confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSources {
    pub scouting: bool,
    pub stats: bool
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProjection {
    pub player_id: i32,
    pub name: String,
    /// Organization the player is attributed to
    pub team_id: Option<i32>,
    pub level: Option<Level>,
    pub age: Option<f64>,
    pub player_type: PlayerType,
    /// Present-day ability
    pub true_rating: RatingResult,
    /// Projected peak ability
    pub true_future_rating: RatingResult,
    pub components: Vec<ComponentRating>,
    /// FIP for pitchers, wOBA for hitters, at the current grades
    pub current_stat: f64,
    /// FIP for pitchers, wOBA for hitters, at the ceiling grades
    pub peak_stat: f64,
    pub projected_war: f64,
    /// Current ability was read from an established MLB sample rather than a development curve
    pub established: bool,
    pub sources: EvidenceSources
}

impl PlayerProjection {
    pub fn component(&self, component: Component) -> Option<&ComponentRating> {
        self.components.iter().find(|c| c.component == component)
    }

    pub fn is_prospect(&self) -> bool {
        !self.level.map(|l| l.is_mlb()).unwrap_or(false)
    }
}
