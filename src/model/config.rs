//! Every tunable weight, threshold and curve the engine uses.
//!
//! The configuration is plain data: it can be loaded from JSON and is checked
//! by [`EngineConfig::validate`] before any service accepts it.

use crate::model::{
    constants::*,
    structures::{
        component::{Component, Metric},
        level::Level
    }
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};
use strum::IntoEnumIterator;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: String, reason: String }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into()
    }
}

/// Linear map from a 20–80 grade to the component's MLB rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoutingFormula {
    pub intercept: f64,
    pub slope: f64
}

impl ScoutingFormula {
    pub fn rate(&self, grade: f64) -> f64 {
        self.intercept + self.slope * grade
    }

    /// Inverse of [`ScoutingFormula::rate`], unclamped.
    pub fn grade(&self, rate: f64) -> f64 {
        (rate - self.intercept) / self.slope
    }
}

/// Upper edges of the "below minimum", "low" and "mid" sample buckets;
/// anything at or above `mid` is "high".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleBuckets {
    pub minimum: f64,
    pub low: f64,
    pub mid: f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketWeights {
    pub below_minimum: f64,
    pub low: f64,
    pub mid: f64,
    pub high: f64
}

/// Scouting weight as a step function of level-weighted sample size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendSchedule {
    /// Stats in this component do not carry across levels; scouting decides alone
    pub scouting_only: bool,
    pub buckets: SampleBuckets,
    pub weights: BucketWeights
}

impl BlendSchedule {
    pub fn scouting_only() -> BlendSchedule {
        BlendSchedule {
            scouting_only: true,
            buckets: SampleBuckets {
                minimum: 0.0,
                low: 0.0,
                mid: 0.0
            },
            weights: BucketWeights {
                below_minimum: 1.0,
                low: 1.0,
                mid: 1.0,
                high: 1.0
            }
        }
    }

    fn stepped(buckets: [f64; 3], weights: [f64; 4]) -> BlendSchedule {
        BlendSchedule {
            scouting_only: false,
            buckets: SampleBuckets {
                minimum: buckets[0],
                low: buckets[1],
                mid: buckets[2]
            },
            weights: BucketWeights {
                below_minimum: weights[0],
                low: weights[1],
                mid: weights[2],
                high: weights[3]
            }
        }
    }

    /// Raw bucket weight for `sample`, before any floor is applied.
    pub fn bucket_weight(&self, sample: f64) -> f64 {
        if self.scouting_only {
            return 1.0;
        }

        if sample < self.buckets.minimum {
            self.weights.below_minimum
        } else if sample < self.buckets.low {
            self.weights.low
        } else if sample < self.buckets.mid {
            self.weights.mid
        } else {
            self.weights.high
        }
    }
}

/// Additive offset for moving one level up, keyed by the level being left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSteps {
    pub aaa: f64,
    pub aa: f64,
    pub a: f64,
    pub rookie: f64
}

impl LevelSteps {
    pub fn step(&self, level: Level) -> f64 {
        match level {
            Level::Mlb => 0.0,
            Level::Aaa => self.aaa,
            Level::Aa => self.aa,
            Level::A => self.a,
            Level::Rookie => self.rookie
        }
    }

    /// Cumulative offset that translates a rate observed at `level` into an MLB-equivalent rate.
    pub fn offset_to_mlb(&self, level: Level) -> f64 {
        level.steps_to_mlb().into_iter().map(|l| self.step(l)).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub age: f64,
    pub value: f64
}

/// Players who peaked with a rate in `[peak_min, peak_max)`, and what that
/// group looked like at each age on the way there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentCohort {
    pub label: String,
    pub peak_min: f64,
    pub peak_max: f64,
    /// Ascending by age
    pub curve: Vec<CurvePoint>,
    /// Spread of individual-to-cohort ratios observed at the same age
    pub ratio_dispersion: f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub formula: ScoutingFormula,
    pub blend: BlendSchedule,
    pub level_steps: LevelSteps,
    /// Sample size at which observed noise and signal weigh equally
    pub stabilization: f64,
    /// Ordered by `peak_min`; empty for components without a raw equivalent
    pub cohorts: Vec<DevelopmentCohort>
}

/// One field per component so lookups can never miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfigs {
    pub stuff: ComponentConfig,
    pub control: ComponentConfig,
    pub hra: ComponentConfig,
    pub eye: ComponentConfig,
    pub avoid_k: ComponentConfig,
    pub power: ComponentConfig,
    pub contact: ComponentConfig,
    pub gap: ComponentConfig,
    pub speed: ComponentConfig
}

impl ComponentConfigs {
    pub fn get(&self, component: Component) -> &ComponentConfig {
        match component {
            Component::Stuff => &self.stuff,
            Component::Control => &self.control,
            Component::Hra => &self.hra,
            Component::Eye => &self.eye,
            Component::AvoidK => &self.avoid_k,
            Component::Power => &self.power,
            Component::Contact => &self.contact,
            Component::Gap => &self.gap,
            Component::Speed => &self.speed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelWeights {
    pub mlb: f64,
    pub aaa: f64,
    pub aa: f64,
    pub a: f64,
    pub rookie: f64
}

impl LevelWeights {
    pub fn weight(&self, level: Level) -> f64 {
        match level {
            Level::Mlb => self.mlb,
            Level::Aaa => self.aaa,
            Level::Aa => self.aa,
            Level::A => self.a,
            Level::Rookie => self.rookie
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingThreshold {
    pub min_percentile: f64,
    pub rating: f64
}

/// Descending thresholds, first match wins. Must end at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    pub thresholds: Vec<RatingThreshold>
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentConfig {
    /// Rating points per 100% deviation from the cohort's expected value
    pub sensitivity: f64,
    /// Deviation bound in multiples of the cohort's ratio dispersion
    pub dispersion_bound: f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaneRange {
    pub min: f64,
    pub max: f64
}

impl SaneRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// Seasons before the requested year that make up the population
    pub years_back: u32,
    pub age_min: u32,
    pub age_max: u32,
    pub min_outs: u32,
    pub min_pa: u32,
    pub sane_ranges: BTreeMap<Metric, SaneRange>
}

/// League run environment used when a season's own data cannot supply it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueDefaults {
    pub fip_constant: f64,
    pub era: f64,
    pub woba: f64,
    pub woba_scale: f64,
    pub woba_bb: f64,
    pub woba_single: f64,
    pub woba_double: f64,
    pub woba_triple: f64,
    pub woba_hr: f64,
    pub doubles_share_of_xbh: f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub established_mlb_outs: u32,
    pub established_mlb_pa: u32,
    pub projected_ip_starter: f64,
    pub projected_ip_reliever: f64,
    pub projected_pa: f64,
    pub replacement_fip_offset: f64,
    pub replacement_woba_offset: f64,
    pub runs_per_win: f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Pitching appearances needed before games-started share is trusted
    pub min_games: u32,
    pub starter_gs_share: f64,
    pub starter_min_stamina: f64,
    pub starter_min_pitches: u8
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FarmTier {
    pub min_rating: f64,
    pub value: f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    pub prospect_max_age: f64,
    pub farm_top_prospects: usize,
    /// Descending by `min_rating`
    pub farm_tiers: Vec<FarmTier>,
    pub rotation_size: usize,
    pub bullpen_size: usize,
    pub lineup_size: usize,
    pub rotation_weight: f64,
    pub bullpen_weight: f64,
    pub lineup_weight: f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeaderConfig {
    pub min_outs: u32,
    pub min_pa: u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub components: ComponentConfigs,
    pub level_weights: LevelWeights,
    /// Most recent season first; seasons past the end are ignored
    pub recency_weights: Vec<f64>,
    pub minimum_scouting_weight: f64,
    pub rating_table: RatingTable,
    pub development: DevelopmentConfig,
    pub distribution: DistributionConfig,
    pub league: LeagueDefaults,
    pub projection: ProjectionConfig,
    pub classification: ClassificationConfig,
    pub rankings: RankingConfig,
    pub leaders: LeaderConfig
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<EngineConfig, ConfigError> {
        let config: EngineConfig = serde_json::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source
        })?;

        EngineConfig::from_json(&text)
    }

    pub fn component(&self, component: Component) -> &ComponentConfig {
        self.components.get(component)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for component in Component::iter() {
            validate_component(component, self.component(component))?;
        }

        for level in Level::iter() {
            let weight = self.level_weights.weight(level);
            if !(weight > 0.0 && weight <= 1.0) {
                return Err(invalid(format!("level_weights.{:?}", level), "must be in (0, 1]"));
            }
        }

        if self.recency_weights.is_empty() || self.recency_weights.iter().any(|w| !(*w > 0.0)) {
            return Err(invalid("recency_weights", "must be non-empty and positive"));
        }

        if !(0.0..=1.0).contains(&self.minimum_scouting_weight) {
            return Err(invalid("minimum_scouting_weight", "must be in [0, 1]"));
        }

        validate_rating_table(&self.rating_table)?;

        if !(self.development.sensitivity >= 0.0) || !(self.development.dispersion_bound > 0.0) {
            return Err(invalid("development", "sensitivity must be >= 0 and dispersion_bound > 0"));
        }

        let dist = &self.distribution;
        if dist.years_back == 0 {
            return Err(invalid("distribution.years_back", "must be at least 1"));
        }
        if dist.age_min > dist.age_max {
            return Err(invalid("distribution.age_min", "must not exceed age_max"));
        }
        for metric in Metric::iter() {
            match dist.sane_ranges.get(&metric) {
                Some(range) if range.min < range.max => {}
                Some(_) => return Err(invalid(format!("distribution.sane_ranges.{}", metric), "min must be below max")),
                None => return Err(invalid(format!("distribution.sane_ranges.{}", metric), "missing"))
            }
        }

        if !(self.league.woba_scale > 0.0) {
            return Err(invalid("league.woba_scale", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.league.doubles_share_of_xbh) {
            return Err(invalid("league.doubles_share_of_xbh", "must be in [0, 1]"));
        }
        if !(self.projection.runs_per_win > 0.0) {
            return Err(invalid("projection.runs_per_win", "must be positive"));
        }

        if !(0.0..=1.0).contains(&self.classification.starter_gs_share) {
            return Err(invalid("classification.starter_gs_share", "must be in [0, 1]"));
        }

        let rankings = &self.rankings;
        if rankings.rotation_weight < 0.0 || rankings.bullpen_weight < 0.0 || rankings.lineup_weight < 0.0 {
            return Err(invalid("rankings", "group weights must not be negative"));
        }
        if rankings
            .farm_tiers
            .windows(2)
            .any(|w| w[0].min_rating <= w[1].min_rating)
        {
            return Err(invalid("rankings.farm_tiers", "must be strictly descending by min_rating"));
        }

        Ok(())
    }
}

fn validate_component(component: Component, config: &ComponentConfig) -> Result<(), ConfigError> {
    let field = |name: &str| format!("components.{}.{}", component, name);

    if !config.formula.slope.is_finite() || config.formula.slope == 0.0 {
        return Err(invalid(field("formula.slope"), "must be finite and non-zero"));
    }
    // A grade increase must move the rate in the component's good direction
    if (config.formula.slope > 0.0) != component.higher_is_better() {
        return Err(invalid(field("formula.slope"), "sign disagrees with the metric's direction"));
    }

    let blend = &config.blend;
    let w = &blend.weights;
    if [w.below_minimum, w.low, w.mid, w.high]
        .iter()
        .any(|w| !(0.0..=1.0).contains(w))
    {
        return Err(invalid(field("blend.weights"), "must be in [0, 1]"));
    }
    if !blend.scouting_only && !(blend.buckets.minimum <= blend.buckets.low && blend.buckets.low <= blend.buckets.mid) {
        return Err(invalid(field("blend.buckets"), "must be ascending"));
    }

    if !(config.stabilization > 0.0) {
        return Err(invalid(field("stabilization"), "must be positive"));
    }

    if component.has_raw_equivalent() && config.cohorts.is_empty() {
        return Err(invalid(field("cohorts"), "at least one cohort is required"));
    }

    for (i, cohort) in config.cohorts.iter().enumerate() {
        let cohort_field = |name: &str| field(&format!("cohorts[{}].{}", i, name));

        if !(cohort.peak_min < cohort.peak_max) {
            return Err(invalid(cohort_field("peak_min"), "must be below peak_max"));
        }
        if cohort.curve.is_empty() {
            return Err(invalid(cohort_field("curve"), "must not be empty"));
        }
        if cohort.curve.windows(2).any(|w| w[0].age >= w[1].age) {
            return Err(invalid(cohort_field("curve"), "ages must be strictly ascending"));
        }
        if !(cohort.ratio_dispersion > 0.0) {
            return Err(invalid(cohort_field("ratio_dispersion"), "must be positive"));
        }
    }

    if config.cohorts.windows(2).any(|w| w[0].peak_max > w[1].peak_min) {
        return Err(invalid(field("cohorts"), "ranges must be ordered and must not overlap"));
    }

    Ok(())
}

fn validate_rating_table(table: &RatingTable) -> Result<(), ConfigError> {
    let thresholds = &table.thresholds;

    match thresholds.last() {
        None => return Err(invalid("rating_table", "must not be empty")),
        Some(last) if last.min_percentile > 0.0 => {
            return Err(invalid("rating_table", "must be exhaustive down to percentile 0"))
        }
        Some(_) => {}
    }

    if thresholds
        .windows(2)
        .any(|w| w[0].min_percentile <= w[1].min_percentile || w[0].rating < w[1].rating)
    {
        return Err(invalid("rating_table", "thresholds must be descending"));
    }

    Ok(())
}

const CURVE_AGES: [f64; 5] = [18.0, 20.0, 22.0, 24.0, 26.0];

fn cohort(label: &str, peak_min: f64, peak_max: f64, values: [f64; 5], ratio_dispersion: f64) -> DevelopmentCohort {
    DevelopmentCohort {
        label: label.to_string(),
        peak_min,
        peak_max,
        curve: CURVE_AGES
            .iter()
            .zip(values)
            .map(|(&age, value)| CurvePoint { age, value })
            .collect(),
        ratio_dispersion
    }
}

fn steps(aaa: f64, aa: f64, a: f64, rookie: f64) -> LevelSteps {
    LevelSteps { aaa, aa, a, rookie }
}

fn formula(intercept: f64, slope: f64) -> ScoutingFormula {
    ScoutingFormula { intercept, slope }
}

impl Default for ComponentConfigs {
    fn default() -> Self {
        ComponentConfigs {
            stuff: ComponentConfig {
                formula: formula(K9_INTERCEPT, K9_SLOPE),
                blend: BlendSchedule::stepped([20.0, 75.0, 150.0], [0.95, 0.75, 0.6, 0.45]),
                // Cumulative: AAA +0.30, AA +0.33, A +0.22, R +0.45
                level_steps: steps(0.30, 0.03, -0.11, 0.23),
                stabilization: 70.0,
                cohorts: vec![
                    cohort("low", 3.0, 5.5, [3.6, 3.9, 4.2, 4.5, 4.7], 0.18),
                    cohort("average", 5.5, 7.0, [4.4, 4.9, 5.4, 5.9, 6.2], 0.16),
                    cohort("plus", 7.0, 8.5, [5.2, 5.9, 6.6, 7.2, 7.6], 0.15),
                    cohort("elite", 8.5, 12.0, [6.0, 7.0, 8.0, 8.8, 9.3], 0.14)
                ]
            },
            control: ComponentConfig {
                formula: formula(BB9_INTERCEPT, BB9_SLOPE),
                blend: BlendSchedule::scouting_only(),
                // Cumulative: AAA -0.42, AA -0.47, A -0.59, R -0.58
                level_steps: steps(-0.42, -0.05, -0.12, 0.01),
                stabilization: 170.0,
                cohorts: vec![
                    cohort("plus", 1.0, 2.5, [4.0, 3.5, 3.0, 2.5, 2.2], 0.22),
                    cohort("average", 2.5, 3.5, [4.8, 4.3, 3.8, 3.3, 3.0], 0.2),
                    cohort("wild", 3.5, 6.0, [5.8, 5.3, 4.8, 4.3, 4.0], 0.2)
                ]
            },
            hra: ComponentConfig {
                formula: formula(HR9_INTERCEPT, HR9_SLOPE),
                blend: BlendSchedule::stepped([40.0, 100.0, 200.0], [1.0, 0.85, 0.75, 0.65]),
                // Cumulative: AAA +0.14, AA +0.06, A +0.07, R +0.06
                level_steps: steps(0.14, -0.08, 0.01, -0.01),
                stabilization: 300.0,
                cohorts: vec![
                    cohort("stingy", 0.3, 0.9, [1.3, 1.15, 1.0, 0.85, 0.75], 0.3),
                    cohort("average", 0.9, 1.3, [1.6, 1.45, 1.3, 1.15, 1.05], 0.28),
                    cohort("homer_prone", 1.3, 2.5, [1.9, 1.8, 1.7, 1.55, 1.45], 0.25)
                ]
            },
            eye: ComponentConfig {
                formula: formula(BB_PCT_INTERCEPT, BB_PCT_SLOPE),
                blend: BlendSchedule::scouting_only(),
                level_steps: steps(-0.3, -0.2, -0.2, -0.2),
                stabilization: 120.0,
                cohorts: vec![
                    cohort("free_swinger", 2.0, 7.0, [4.0, 4.6, 5.2, 5.8, 6.1], 0.3),
                    cohort("average", 7.0, 10.0, [5.5, 6.4, 7.2, 8.0, 8.5], 0.25),
                    cohort("patient", 10.0, 20.0, [7.0, 8.3, 9.6, 10.8, 11.5], 0.22)
                ]
            },
            avoid_k: ComponentConfig {
                formula: formula(K_PCT_INTERCEPT, K_PCT_SLOPE),
                blend: BlendSchedule::stepped([60.0, 200.0, 400.0], [0.95, 0.7, 0.55, 0.4]),
                level_steps: steps(1.0, 0.8, 0.8, 1.0),
                stabilization: 60.0,
                cohorts: vec![
                    cohort("contact", 8.0, 16.0, [22.0, 19.5, 17.0, 15.0, 14.0], 0.18),
                    cohort("average", 16.0, 22.0, [27.0, 24.5, 22.0, 20.0, 19.0], 0.15),
                    cohort("swing_and_miss", 22.0, 35.0, [32.0, 30.0, 28.0, 26.0, 25.0], 0.14)
                ]
            },
            power: ComponentConfig {
                formula: formula(HR_PCT_INTERCEPT, HR_PCT_SLOPE),
                blend: BlendSchedule::stepped([100.0, 300.0, 500.0], [1.0, 0.8, 0.65, 0.5]),
                level_steps: steps(-0.3, -0.2, -0.2, -0.2),
                stabilization: 170.0,
                cohorts: vec![
                    cohort("slap", 0.0, 2.0, [0.6, 0.9, 1.2, 1.4, 1.5], 0.4),
                    cohort("average", 2.0, 3.5, [1.0, 1.5, 2.0, 2.5, 2.8], 0.35),
                    cohort("slugger", 3.5, 8.0, [1.6, 2.4, 3.2, 3.9, 4.3], 0.3)
                ]
            },
            contact: ComponentConfig {
                formula: formula(BABIP_INTERCEPT, BABIP_SLOPE),
                blend: BlendSchedule::stepped([100.0, 300.0, 600.0], [1.0, 0.85, 0.7, 0.6]),
                level_steps: steps(-0.006, -0.004, -0.004, -0.004),
                stabilization: 820.0,
                cohorts: vec![
                    cohort("weak", 0.200, 0.285, [0.270, 0.274, 0.277, 0.279, 0.281], 0.07),
                    cohort("average", 0.285, 0.315, [0.283, 0.290, 0.296, 0.300, 0.303], 0.06),
                    cohort("plus", 0.315, 0.400, [0.295, 0.305, 0.314, 0.320, 0.324], 0.06)
                ]
            },
            gap: ComponentConfig {
                formula: formula(XBH_INTERCEPT, XBH_SLOPE),
                blend: BlendSchedule::stepped([100.0, 300.0, 500.0], [1.0, 0.85, 0.7, 0.6]),
                level_steps: steps(-0.004, -0.003, -0.003, -0.003),
                stabilization: 500.0,
                cohorts: vec![
                    cohort("limited", 0.0, 0.045, [0.026, 0.030, 0.034, 0.037, 0.039], 0.22),
                    cohort("average", 0.045, 0.060, [0.033, 0.039, 0.045, 0.050, 0.053], 0.2),
                    cohort("gap_power", 0.060, 0.120, [0.040, 0.048, 0.056, 0.063, 0.067], 0.2)
                ]
            },
            speed: ComponentConfig {
                formula: formula(SB_INTERCEPT, SB_SLOPE),
                blend: BlendSchedule::stepped([50.0, 200.0, 400.0], [0.9, 0.7, 0.55, 0.45]),
                level_steps: steps(-0.002, -0.001, -0.001, -0.001),
                stabilization: 200.0,
                cohorts: Vec::new()
            }
        }
    }
}

impl Default for RatingTable {
    fn default() -> Self {
        let table = [
            (99.0, 5.0),
            (97.0, 4.5),
            (93.0, 4.0),
            (75.0, 3.5),
            (60.0, 3.0),
            (35.0, 2.5),
            (20.0, 2.0),
            (10.0, 1.5),
            (5.0, 1.0),
            (0.0, 0.5)
        ];

        RatingTable {
            thresholds: table
                .iter()
                .map(|&(min_percentile, rating)| RatingThreshold { min_percentile, rating })
                .collect()
        }
    }
}

fn default_sane_ranges() -> BTreeMap<Metric, SaneRange> {
    let ranges = [
        (Metric::K9, 2.0, 15.0),
        (Metric::Bb9, 0.5, 8.0),
        (Metric::Hr9, 0.1, 3.0),
        (Metric::Fip, 1.5, 7.5),
        (Metric::BbPct, 1.0, 20.0),
        (Metric::KPct, 5.0, 40.0),
        (Metric::HrPct, 0.0, 8.0),
        (Metric::Babip, 0.200, 0.400),
        (Metric::XbhRate, 0.0, 0.150),
        (Metric::SbRate, 0.0, 0.150),
        (Metric::Woba, 0.200, 0.450)
    ];

    ranges
        .iter()
        .map(|&(metric, min, max)| (metric, SaneRange { min, max }))
        .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        let [mlb, aaa, aa, a, rookie] = LEVEL_SAMPLE_WEIGHTS;

        EngineConfig {
            components: ComponentConfigs::default(),
            level_weights: LevelWeights { mlb, aaa, aa, a, rookie },
            recency_weights: RECENCY_WEIGHTS.to_vec(),
            minimum_scouting_weight: MIN_SCOUTING_WEIGHT,
            rating_table: RatingTable::default(),
            development: DevelopmentConfig {
                sensitivity: DEVELOPMENT_SENSITIVITY,
                dispersion_bound: DEVIATION_DISPERSION_BOUND
            },
            distribution: DistributionConfig {
                years_back: DISTRIBUTION_YEARS,
                age_min: PRIME_AGE_MIN,
                age_max: PRIME_AGE_MAX,
                min_outs: DISTRIBUTION_MIN_OUTS,
                min_pa: DISTRIBUTION_MIN_PA,
                sane_ranges: default_sane_ranges()
            },
            league: LeagueDefaults {
                fip_constant: FIP_CONSTANT,
                era: LEAGUE_ERA,
                woba: LEAGUE_WOBA,
                woba_scale: WOBA_SCALE,
                woba_bb: WOBA_BB,
                woba_single: WOBA_SINGLE,
                woba_double: WOBA_DOUBLE,
                woba_triple: WOBA_TRIPLE,
                woba_hr: WOBA_HR,
                doubles_share_of_xbh: DOUBLES_SHARE_OF_XBH
            },
            projection: ProjectionConfig {
                established_mlb_outs: ESTABLISHED_MLB_OUTS,
                established_mlb_pa: ESTABLISHED_MLB_PA,
                projected_ip_starter: PROJECTED_IP_STARTER,
                projected_ip_reliever: PROJECTED_IP_RELIEVER,
                projected_pa: PROJECTED_PA,
                replacement_fip_offset: REPLACEMENT_FIP_OFFSET,
                replacement_woba_offset: REPLACEMENT_WOBA_OFFSET,
                runs_per_win: RUNS_PER_WIN
            },
            classification: ClassificationConfig {
                min_games: MIN_GAMES_FOR_ROLE,
                starter_gs_share: STARTER_GS_SHARE,
                starter_min_stamina: STARTER_MIN_STAMINA,
                starter_min_pitches: STARTER_MIN_PITCHES
            },
            rankings: RankingConfig {
                prospect_max_age: PROSPECT_MAX_AGE,
                farm_top_prospects: FARM_TOP_PROSPECTS,
                farm_tiers: [(5.0, 10.0), (4.5, 7.0), (4.0, 5.0), (3.5, 3.0), (3.0, 1.5), (2.5, 0.5)]
                    .iter()
                    .map(|&(min_rating, value)| FarmTier { min_rating, value })
                    .collect(),
                rotation_size: ROTATION_SIZE,
                bullpen_size: BULLPEN_SIZE,
                lineup_size: LINEUP_SIZE,
                rotation_weight: ROTATION_WEIGHT,
                bullpen_weight: BULLPEN_WEIGHT,
                lineup_weight: LINEUP_WEIGHT
            },
            leaders: LeaderConfig {
                min_outs: LEADER_MIN_OUTS,
                min_pa: LEADER_MIN_PA
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        config::{ConfigError, EngineConfig, RatingThreshold},
        structures::{component::Component, level::Level}
    };
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_json_round_trip_validates() {
        let json = serde_json::to_string(&EngineConfig::default()).unwrap();
        let config = EngineConfig::from_json(&json).unwrap();

        assert_eq!(config.rating_table.thresholds.len(), 10);
        assert_eq!(config.components.stuff.cohorts.len(), 4);
        assert_abs_diff_eq!(config.league.fip_constant, 3.47, epsilon = 1e-12);
    }

    #[test]
    fn test_cumulative_level_offsets() {
        let config = EngineConfig::default();
        let stuff = &config.component(Component::Stuff).level_steps;
        let control = &config.component(Component::Control).level_steps;
        let hra = &config.component(Component::Hra).level_steps;

        assert_abs_diff_eq!(stuff.offset_to_mlb(Level::Mlb), 0.0);
        assert_abs_diff_eq!(stuff.offset_to_mlb(Level::Aaa), 0.30, epsilon = 1e-9);
        assert_abs_diff_eq!(stuff.offset_to_mlb(Level::Aa), 0.33, epsilon = 1e-9);
        assert_abs_diff_eq!(stuff.offset_to_mlb(Level::A), 0.22, epsilon = 1e-9);
        assert_abs_diff_eq!(stuff.offset_to_mlb(Level::Rookie), 0.45, epsilon = 1e-9);
        assert_abs_diff_eq!(control.offset_to_mlb(Level::A), -0.59, epsilon = 1e-9);
        assert_abs_diff_eq!(control.offset_to_mlb(Level::Rookie), -0.58, epsilon = 1e-9);
        assert_abs_diff_eq!(hra.offset_to_mlb(Level::Aa), 0.06, epsilon = 1e-9);
    }

    #[test]
    fn test_scouting_formula_inverts() {
        let config = EngineConfig::default();
        let stuff = config.component(Component::Stuff).formula;

        assert_abs_diff_eq!(stuff.rate(50.0), 5.77, epsilon = 1e-9);
        assert_abs_diff_eq!(stuff.grade(stuff.rate(63.0)), 63.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bucket_weights() {
        let config = EngineConfig::default();
        let stuff = config.component(Component::Stuff).blend;

        assert_eq!(stuff.bucket_weight(10.0), 0.95);
        assert_eq!(stuff.bucket_weight(20.0), 0.75);
        assert_eq!(stuff.bucket_weight(149.9), 0.6);
        assert_eq!(stuff.bucket_weight(400.0), 0.45);
        assert_eq!(config.component(Component::Control).blend.bucket_weight(1000.0), 1.0);
    }

    #[test]
    fn test_rejects_table_not_ending_at_zero() {
        let mut config = EngineConfig::default();
        config.rating_table.thresholds.pop();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "rating_table"));
    }

    #[test]
    fn test_rejects_unsorted_table() {
        let mut config = EngineConfig::default();
        config.rating_table.thresholds.insert(
            0,
            RatingThreshold {
                min_percentile: 50.0,
                rating: 5.0
            }
        );

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_overlapping_cohorts() {
        let mut config = EngineConfig::default();
        config.components.stuff.cohorts[1].peak_min = 5.0;

        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "components.stuff.cohorts"),
            other => panic!("Expected invalid cohorts, got {:?}", other)
        }
    }

    #[test]
    fn test_rejects_wrong_slope_direction() {
        let mut config = EngineConfig::default();
        config.components.control.formula.slope = 0.052;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_sane_range() {
        let mut config = EngineConfig::default();
        config.distribution.sane_ranges.clear();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_json_is_reported() {
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Json(_))));
    }
}
