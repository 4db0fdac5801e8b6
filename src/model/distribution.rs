//! Reference Distribution Builder.
//!
//! Ratings are anchored to what established major leaguers in their prime
//! actually produced. For every metric the builder collects one value per
//! qualifying player-season over several past seasons and sorts them.

use crate::{
    model::{
        config::EngineConfig,
        constants::{AGE_REFERENCE_DAY, AGE_REFERENCE_MONTH},
        structures::{component::Metric, reference_distribution::ReferenceDistribution}
    },
    stats::{
        league::LeagueConstants,
        repository::StatsRepository,
        stats_structs::{season_reference_date, BattingStat, PitchingStat, Player}
    }
};
use futures::future::join_all;
use itertools::Itertools;
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex}
};
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

/// All reference distributions built against one set of league constants.
#[derive(Debug, Clone)]
pub struct DistributionSet {
    pub league: LeagueConstants,
    distributions: BTreeMap<Metric, ReferenceDistribution>
}

impl DistributionSet {
    pub fn get(&self, metric: Metric) -> Option<&ReferenceDistribution> {
        self.distributions.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceDistribution> {
        self.distributions.values()
    }
}

/// The raw material for a population: MLB seasons and the players behind them.
pub struct PopulationInput<'a> {
    pub pitching: &'a [PitchingStat],
    pub batting: &'a [BattingStat],
    pub players: &'a [Player]
}

fn age_in_season(player: &Player, year: i32) -> Option<u32> {
    let date = season_reference_date(year, AGE_REFERENCE_MONTH, AGE_REFERENCE_DAY)?;
    player.whole_age_on(date)
}

/// Builds a distribution for each of `metrics` from the prime-age, minimum-sample
/// MLB player-seasons in `input`. Values outside a metric's sane range are dropped.
pub fn build_distributions(
    metrics: &[Metric],
    input: &PopulationInput<'_>,
    league: &LeagueConstants,
    config: &EngineConfig
) -> DistributionSet {
    let dist_config = &config.distribution;
    let players: HashMap<i32, &Player> = input.players.iter().map(|p| (p.id, p)).collect();

    let in_prime = |player_id: i32, year: i32| {
        players
            .get(&player_id)
            .and_then(|p| age_in_season(p, year))
            .is_some_and(|age| age >= dist_config.age_min && age <= dist_config.age_max)
    };

    let pitchers = input
        .pitching
        .iter()
        .filter(|s| s.level.is_mlb() && s.outs >= dist_config.min_outs && in_prime(s.player_id, s.year))
        .collect_vec();
    let hitters = input
        .batting
        .iter()
        .filter(|s| s.level.is_mlb() && s.pa >= dist_config.min_pa && in_prime(s.player_id, s.year))
        .collect_vec();

    debug!(
        "Reference population: {} pitcher-seasons, {} hitter-seasons",
        pitchers.len(),
        hitters.len()
    );

    let mut fip_league = config.league;
    fip_league.fip_constant = league.fip_constant;

    let mut distributions = BTreeMap::new();
    for &metric in metrics {
        let values: Vec<f64> = if metric.is_pitching() {
            pitchers
                .iter()
                .filter_map(|s| s.rate(metric, league.fip_constant))
                .collect()
        } else {
            hitters.iter().filter_map(|s| s.rate(metric, &fip_league)).collect()
        };

        let values = match dist_config.sane_ranges.get(&metric) {
            Some(range) => values.into_iter().filter(|v| range.contains(*v)).collect(),
            None => values
        };

        let distribution = ReferenceDistribution::from_unsorted(metric, values);
        if distribution.is_empty() {
            warn!("Reference distribution for {} is empty", metric);
        }
        distributions.insert(metric, distribution);
    }

    DistributionSet {
        league: *league,
        distributions
    }
}

/// Builds and memoizes distribution sets for the process lifetime. A set with
/// an empty distribution is handed out but not kept.
pub struct DistributionService {
    repository: Arc<StatsRepository>,
    config: Arc<EngineConfig>,
    memo: Mutex<HashMap<String, Arc<DistributionSet>>>
}

impl DistributionService {
    pub fn new(repository: Arc<StatsRepository>, config: Arc<EngineConfig>) -> DistributionService {
        DistributionService {
            repository,
            config,
            memo: Mutex::new(HashMap::new())
        }
    }

    fn memo_key(year: i32, league: &LeagueConstants) -> String {
        format!("{}@{}", year, league.cache_key())
    }

    /// Distributions for rating `year`, built from the seasons before it.
    /// Changing the league constants yields a fresh build.
    pub async fn get(&self, year: i32, league: &LeagueConstants) -> Arc<DistributionSet> {
        let key = Self::memo_key(year, league);
        if let Some(set) = self.memo.lock().unwrap_or_else(|e| e.into_inner()).get(&key) {
            return set.clone();
        }

        let years_back = self.config.distribution.years_back as i32;
        let years = ((year - years_back)..year).collect_vec();

        let pitching = join_all(years.iter().map(|y| self.repository.get_season_stats::<PitchingStat>(*y))).await;
        let batting = join_all(years.iter().map(|y| self.repository.get_season_stats::<BattingStat>(*y))).await;
        let players = self.repository.get_players().await;

        let pitching = pitching.into_iter().flatten().collect_vec();
        let batting = batting.into_iter().flatten().collect_vec();
        let input = PopulationInput {
            pitching: &pitching,
            batting: &batting,
            players: &players
        };

        let metrics = Metric::iter().collect_vec();
        let set = Arc::new(build_distributions(&metrics, &input, league, &self.config));
        info!(
            "Built reference distributions for {} from {}-{}",
            year,
            year - years_back,
            year - 1
        );

        let empty = set.iter().filter(|d| d.is_empty()).map(|d| d.metric).collect_vec();
        if empty.is_empty() {
            self.memo
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(key, set.clone());
        } else {
            // Likely a feed outage; the next request rebuilds
            warn!(
                "Not keeping distributions for {}: no reference values for {}",
                year,
                empty.iter().join(", ")
            );
        }

        set
    }

    pub fn clear(&self) {
        self.memo.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.memo.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
