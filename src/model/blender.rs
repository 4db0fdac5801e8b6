//! Mixing scouting expectation with observed performance, one component at a time.

use crate::model::{
    config::EngineConfig,
    structures::{component::Component, level::Level}
};

/// One season of a component's raw rate at one level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub rate: f64,
    /// Innings for pitching components, plate appearances for hitting ones
    pub sample: f64,
    pub level: Level,
    /// 0 for the most recent season
    pub seasons_ago: usize
}

/// Observations folded into a single MLB-equivalent rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservedSample {
    pub rate: f64,
    /// Level-weighted sample size
    pub sample: f64
}

impl ObservedSample {
    /// Level-adjusts each observation, then averages them weighted by sample,
    /// level and recency. Seasons older than the recency table are ignored.
    /// `None` when nothing usable remains.
    pub fn aggregate(component: Component, observations: &[Observation], config: &EngineConfig) -> Option<ObservedSample> {
        Self::fold(component, observations, config, true)
    }

    /// As [`ObservedSample::aggregate`] but keeps each level's raw rate, which
    /// is what development curves are expressed in.
    pub fn aggregate_raw(
        component: Component,
        observations: &[Observation],
        config: &EngineConfig
    ) -> Option<ObservedSample> {
        Self::fold(component, observations, config, false)
    }

    fn fold(
        component: Component,
        observations: &[Observation],
        config: &EngineConfig,
        level_adjust: bool
    ) -> Option<ObservedSample> {
        let component_config = config.component(component);

        let mut weighted_rate = 0.0;
        let mut total_weight = 0.0;
        let mut sample = 0.0;

        for observation in observations {
            let Some(recency) = config.recency_weights.get(observation.seasons_ago) else {
                continue;
            };
            if !(observation.sample > 0.0) || !observation.rate.is_finite() {
                continue;
            }

            let level_weight = config.level_weights.weight(observation.level);
            let adjusted = if level_adjust {
                observation.rate + component_config.level_steps.offset_to_mlb(observation.level)
            } else {
                observation.rate
            };
            let weight = observation.sample * level_weight * recency;

            weighted_rate += adjusted * weight;
            total_weight += weight;
            sample += observation.sample * level_weight;
        }

        if total_weight <= 0.0 {
            return None;
        }

        Some(ObservedSample {
            rate: weighted_rate / total_weight,
            sample
        })
    }
}

/// A blended rate and how it was reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    pub rate: f64,
    pub scouting_weight: f64,
    pub sample: f64
}

/// Scouting's share of the blend for `sample`. No sample means scouting alone;
/// otherwise the schedule's bucket weight, never below the configured floor.
pub fn scouting_weight(component: Component, sample: f64, config: &EngineConfig) -> f64 {
    if !(sample > 0.0) {
        return 1.0;
    }

    config
        .component(component)
        .blend
        .bucket_weight(sample)
        .max(config.minimum_scouting_weight)
}

/// `weight * scouting + (1 - weight) * observed`.
pub fn blend_component(
    component: Component,
    scouting_rate: f64,
    observed_rate: f64,
    sample: f64,
    config: &EngineConfig
) -> f64 {
    let weight = scouting_weight(component, sample, config);
    if weight >= 1.0 {
        return scouting_rate;
    }

    weight * scouting_rate + (1.0 - weight) * observed_rate
}

/// Blends whichever evidence exists. With one side missing the other is used
/// on its own; with neither there is nothing to rate.
pub fn blend_evidence(
    component: Component,
    scouting_rate: Option<f64>,
    observed: Option<ObservedSample>,
    config: &EngineConfig
) -> Option<Blend> {
    match (scouting_rate, observed) {
        (Some(scouting), Some(observed)) => Some(Blend {
            rate: blend_component(component, scouting, observed.rate, observed.sample, config),
            scouting_weight: scouting_weight(component, observed.sample, config),
            sample: observed.sample
        }),
        (Some(scouting), None) => Some(Blend {
            rate: scouting,
            scouting_weight: 1.0,
            sample: 0.0
        }),
        (None, Some(observed)) => Some(Blend {
            rate: observed.rate,
            scouting_weight: 0.0,
            sample: observed.sample
        }),
        (None, None) => None
    }
}
