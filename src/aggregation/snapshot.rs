//! Year-scoped projection snapshots.
//!
//! League-wide inputs for a year (rosters, multi-year stats, scouting, league
//! constants and reference distributions) are loaded once, behind a
//! single-flight registry, and must be complete before any player is rated.
//! Snapshots then grow team by team: a request only rates organizations that
//! have not been folded in yet.

use crate::{
    aggregation::{
        classify::classify,
        leaders::{league_leaders, LeaderCategory, LeaderEntry},
        rankings::{farm_rankings, power_rankings, FarmRanking, PowerRanking},
        single_flight::FlightRegistry
    },
    model::{
        config::{ConfigError, EngineConfig},
        distribution::{DistributionService, DistributionSet},
        projection::{project_player, PlayerEvidence, ProjectionContext, SeasonLines},
        structures::{player_projection::PlayerProjection, scouting_grade::ScoutingGrade}
    },
    scouting::repository::ScoutingRepository,
    stats::{
        league::LeagueConstants,
        repository::StatsRepository,
        stats_structs::{BattingStat, PitchingStat, Player, Team}
    },
    utils::progress_utils::progress_bar
};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard
    }
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("no players are available for {year}")]
    EmptyRoster { year: i32 }
}

/// Everything league-wide that rating a year needs.
pub struct LeagueData {
    pub year: i32,
    pub players: Arc<Vec<Player>>,
    pub teams: Arc<Vec<Team>>,
    /// Recent seasons by player, most recent first
    pub pitching: HashMap<i32, Vec<PitchingStat>>,
    pub batting: HashMap<i32, Vec<BattingStat>>,
    pub scouting: HashMap<i32, ScoutingGrade>,
    pub league: LeagueConstants,
    pub distributions: Arc<DistributionSet>
}

impl LeagueData {
    /// The parent club a player is attributed to.
    pub fn organization_of(&self, player: &Player) -> Option<i32> {
        if let Some(org) = player.organization_id {
            return Some(org);
        }

        let team_id = player.team_id?;
        Some(
            self.teams
                .iter()
                .find(|t| t.id == team_id)
                .map(|t| t.organization_id())
                .unwrap_or(team_id)
        )
    }
}

/// Rated players for one year, keyed by player id.
#[derive(Debug, Clone)]
pub struct ProjectionSnapshot {
    pub year: i32,
    pub league: LeagueConstants,
    projections: HashMap<i32, PlayerProjection>,
    /// Organizations already folded in
    teams: BTreeSet<i32>,
    /// Every player of the year has been considered
    complete: bool
}

impl ProjectionSnapshot {
    pub fn new(year: i32, league: LeagueConstants) -> ProjectionSnapshot {
        ProjectionSnapshot {
            year,
            league,
            projections: HashMap::new(),
            teams: BTreeSet::new(),
            complete: false
        }
    }

    pub fn get(&self, player_id: i32) -> Option<&PlayerProjection> {
        self.projections.get(&player_id)
    }

    pub fn insert(&mut self, projection: PlayerProjection) {
        self.projections.insert(projection.player_id, projection);
    }

    pub fn projections(&self) -> impl Iterator<Item = &PlayerProjection> {
        self.projections.values()
    }

    /// Players attributed to organization `team_id`.
    pub fn team(&self, team_id: i32) -> impl Iterator<Item = &PlayerProjection> {
        self.projections.values().filter(move |p| p.team_id == Some(team_id))
    }

    pub fn processed_teams(&self) -> &BTreeSet<i32> {
        &self.teams
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}

type LeagueFlight = Result<Arc<LeagueData>, SnapshotError>;

/// Ratings for whole seasons, cached per year and built up one team at a time.
pub struct SnapshotService {
    repository: Arc<StatsRepository>,
    distributions: Arc<DistributionService>,
    scouting: Arc<ScoutingRepository>,
    scouting_source: String,
    config: Arc<EngineConfig>,
    league_data: Arc<Mutex<HashMap<i32, Arc<LeagueData>>>>,
    flights: FlightRegistry<i32, LeagueFlight>,
    snapshots: Mutex<HashMap<i32, Arc<ProjectionSnapshot>>>,
    computations: AtomicUsize
}

impl SnapshotService {
    pub fn new(
        repository: Arc<StatsRepository>,
        scouting: Arc<ScoutingRepository>,
        scouting_source: impl Into<String>,
        config: Arc<EngineConfig>
    ) -> Result<SnapshotService, ConfigError> {
        config.validate()?;

        Ok(SnapshotService {
            distributions: Arc::new(DistributionService::new(repository.clone(), config.clone())),
            repository,
            scouting,
            scouting_source: scouting_source.into(),
            config,
            league_data: Arc::new(Mutex::new(HashMap::new())),
            flights: FlightRegistry::new(),
            snapshots: Mutex::new(HashMap::new()),
            computations: AtomicUsize::new(0)
        })
    }

    /// Per-player rating computations performed so far.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn snapshots(&self) -> MutexGuard<'_, HashMap<i32, Arc<ProjectionSnapshot>>> {
        self.snapshots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// League-wide inputs for `year`. Concurrent callers share one load.
    pub async fn league_data(&self, year: i32) -> Result<Arc<LeagueData>, SnapshotError> {
        if let Some(data) = cached_league_data(&self.league_data, year) {
            return Ok(data);
        }

        let memo = self.league_data.clone();
        let repository = self.repository.clone();
        let distributions = self.distributions.clone();
        let scouting = self.scouting.clone();
        let source = self.scouting_source.clone();
        let config = self.config.clone();

        self.flights
            .run(year, move || async move {
                // A flight that settled since our lookup has already stored its result
                if let Some(data) = cached_league_data(&memo, year) {
                    return Ok(data);
                }

                let data = load_league_data(year, repository, distributions, scouting, source, config).await?;
                // Stored before the flight settles
                memo.lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(year, data.clone());

                Ok(data)
            })
            .await
    }

    /// Every player of `year`.
    pub async fn get_snapshot(&self, year: i32) -> Result<Arc<ProjectionSnapshot>, SnapshotError> {
        if let Some(snapshot) = self.snapshots().get(&year).filter(|s| s.complete) {
            return Ok(snapshot.clone());
        }

        let data = self.league_data(year).await?;
        Ok(self.fold_in(&data, None))
    }

    /// The snapshot for `year` with at least the organizations in `team_ids`.
    /// Organizations already folded in are not rated again.
    pub async fn get_snapshot_for_teams(
        &self,
        year: i32,
        team_ids: &[i32]
    ) -> Result<Arc<ProjectionSnapshot>, SnapshotError> {
        if let Some(snapshot) = self.snapshots().get(&year) {
            if snapshot.complete || team_ids.iter().all(|t| snapshot.teams.contains(t)) {
                debug!("Snapshot {} already covers {:?}", year, team_ids);
                return Ok(snapshot.clone());
            }
        }

        let data = self.league_data(year).await?;
        Ok(self.fold_in(&data, Some(team_ids)))
    }

    /// One player's projection, rating his organization if needed.
    pub async fn get_player_rating(&self, year: i32, player_id: i32) -> Result<Option<PlayerProjection>, SnapshotError> {
        if let Some(projection) = self.snapshots().get(&year).and_then(|s| s.get(player_id).cloned()) {
            return Ok(Some(projection));
        }

        let data = self.league_data(year).await?;
        let Some(player) = data.players.iter().find(|p| p.id == player_id) else {
            return Ok(None);
        };

        let snapshot = match data.organization_of(player) {
            Some(org) => self.get_snapshot_for_teams(year, &[org]).await?,
            None => self.get_snapshot(year).await?
        };

        Ok(snapshot.get(player_id).cloned())
    }

    pub async fn farm_rankings(&self, year: i32) -> Result<Vec<FarmRanking>, SnapshotError> {
        let snapshot = self.get_snapshot(year).await?;
        let data = self.league_data(year).await?;

        Ok(farm_rankings(&snapshot, &data.teams, &self.config.rankings))
    }

    pub async fn power_rankings(&self, year: i32) -> Result<Vec<PowerRanking>, SnapshotError> {
        let snapshot = self.get_snapshot(year).await?;
        let data = self.league_data(year).await?;

        Ok(power_rankings(&snapshot, &data.teams, &self.config.rankings))
    }

    /// Season leaders from the year's combined MLB lines.
    pub async fn league_leaders(
        &self,
        year: i32,
        category: LeaderCategory,
        limit: usize
    ) -> Result<Vec<LeaderEntry>, SnapshotError> {
        let data = self.league_data(year).await?;
        let pitching = self.repository.get_season_stats::<PitchingStat>(year).await;
        let batting = self.repository.get_season_stats::<BattingStat>(year).await;

        let mut league = self.config.league;
        league.fip_constant = data.league.fip_constant;

        Ok(league_leaders(
            category,
            &pitching,
            &batting,
            &data.teams,
            &league,
            &self.config.leaders,
            limit
        ))
    }

    /// Rates the players not yet in the year's snapshot, limited to
    /// `team_ids` when given, and merges them in place.
    fn fold_in(&self, data: &LeagueData, team_ids: Option<&[i32]>) -> Arc<ProjectionSnapshot> {
        let mut snapshots = self.snapshots();
        let entry = snapshots
            .entry(data.year)
            .or_insert_with(|| Arc::new(ProjectionSnapshot::new(data.year, data.league)));

        let pending: BTreeSet<Option<i32>> = match team_ids {
            Some(ids) => ids
                .iter()
                .filter(|id| !entry.teams.contains(*id))
                .map(|id| Some(*id))
                .collect(),
            None => data
                .players
                .iter()
                .map(|p| data.organization_of(p))
                .filter(|org| org.map_or(true, |id| !entry.teams.contains(&id)))
                .collect()
        };

        if pending.is_empty() {
            if team_ids.is_none() {
                Arc::make_mut(entry).complete = true;
            }
            return entry.clone();
        }

        let players: Vec<&Player> = data
            .players
            .iter()
            .filter(|p| pending.contains(&data.organization_of(p)))
            .collect();
        info!(
            "Rating {} players from {} organizations for {}",
            players.len(),
            pending.len(),
            data.year
        );

        let projections = self.rate_players(data, &players);

        let snapshot = Arc::make_mut(entry);
        for projection in projections {
            snapshot.insert(projection);
        }
        snapshot.teams.extend(pending.iter().flatten());
        if team_ids.is_none() {
            snapshot.complete = true;
        }

        entry.clone()
    }

    fn rate_players(&self, data: &LeagueData, players: &[&Player]) -> Vec<PlayerProjection> {
        let ctx = ProjectionContext {
            year: data.year,
            config: &self.config,
            league: &data.league,
            distributions: &data.distributions
        };

        let bar = progress_bar(players.len() as u64, format!("Rating players for {}", data.year));
        let mut projections = Vec::with_capacity(players.len());
        let mut skipped = 0;

        for player in players {
            let pitching = data.pitching.get(&player.id).map(Vec::as_slice).unwrap_or_default();
            let batting = data.batting.get(&player.id).map(Vec::as_slice).unwrap_or_default();
            let scouting = data.scouting.get(&player.id);

            let classification = classify(player, pitching, batting, scouting, &self.config.classification);
            let seasons = if classification.player_type.is_pitcher() {
                SeasonLines::Pitching(pitching)
            } else {
                SeasonLines::Batting(batting)
            };

            let evidence = PlayerEvidence {
                player,
                player_type: classification.player_type,
                scouting,
                seasons
            };

            self.computations.fetch_add(1, Ordering::SeqCst);
            match project_player(&evidence, &ctx) {
                Some(mut projection) => {
                    // Affiliates roll up to their parent club
                    projection.team_id = data.organization_of(player);
                    projections.push(projection);
                }
                None => skipped += 1
            }

            if let Some(bar) = &bar {
                bar.inc(1);
            }
        }

        if let Some(bar) = &bar {
            bar.finish();
        }
        if skipped > 0 {
            debug!("{} players had no scouting or stats and were left out", skipped);
        }

        projections
    }

    /// Forgets everything cached for `year`, including its raw stats.
    pub async fn invalidate(&self, year: i32) {
        self.snapshots().remove(&year);
        self.league_data.lock().unwrap_or_else(|e| e.into_inner()).remove(&year);
        self.repository.invalidate(year).await;
        self.distributions.clear();
    }
}

fn cached_league_data(memo: &Mutex<HashMap<i32, Arc<LeagueData>>>, year: i32) -> Option<Arc<LeagueData>> {
    memo.lock().unwrap_or_else(|e| e.into_inner()).get(&year).cloned()
}

async fn load_league_data(
    year: i32,
    repository: Arc<StatsRepository>,
    distributions: Arc<DistributionService>,
    scouting: Arc<ScoutingRepository>,
    source: String,
    config: Arc<EngineConfig>
) -> Result<Arc<LeagueData>, SnapshotError> {
    let years_back = config.recency_weights.len() as u32;

    // Rosters first: every season fetch joins names against them
    let (players, teams, reports) = tokio::join!(
        repository.get_players(),
        repository.get_teams(),
        scouting.latest(&source)
    );
    let (pitching, batting) = tokio::join!(
        repository.get_multi_year_stats::<PitchingStat>(year, years_back),
        repository.get_multi_year_stats::<BattingStat>(year, years_back)
    );
    // Served from memory by now
    let (season_pitching, season_batting) = tokio::join!(
        repository.get_season_stats::<PitchingStat>(year),
        repository.get_season_stats::<BattingStat>(year)
    );

    if players.is_empty() {
        return Err(SnapshotError::EmptyRoster { year });
    }

    let scouting = match reports {
        Ok(Some(set)) => set.by_player(),
        Ok(None) => {
            warn!("No scouting uploads from '{}', rating from stats alone", source);
            HashMap::new()
        }
        Err(e) => {
            warn!("Scouting upload from '{}' is unusable, rating from stats alone: {}", source, e);
            HashMap::new()
        }
    };

    let league = LeagueConstants::from_pitching(&season_pitching, &config.league).with_batting(&season_batting, &config.league);
    let distributions = distributions.get(year, &league).await;

    info!(
        "Loaded {} players, {} teams and {} scouting reports for {}",
        players.len(),
        teams.len(),
        scouting.len(),
        year
    );

    Ok(Arc::new(LeagueData {
        year,
        players,
        teams,
        pitching,
        batting,
        scouting,
        league,
        distributions
    }))
}
