use crate::{
    model::structures::{
        level::Level,
        player_projection::{EvidenceSources, PlayerProjection},
        player_type::PlayerType,
        rating_result::RatingResult,
        stat_kind::StatKind
    },
    stats::{
        feed::{FeedError, StatsFeed},
        stats_structs::{BattingStat, PitchingStat, Player}
    }
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex
    }
};

/// In-memory [`StatsFeed`] that counts every fetch.
#[derive(Default)]
pub struct FakeFeed {
    stats: Mutex<HashMap<(i32, StatKind), String>>,
    players: Option<String>,
    teams: Option<String>,
    stats_calls: Mutex<HashMap<(i32, StatKind), usize>>,
    players_calls: AtomicUsize,
    teams_calls: AtomicUsize
}

impl FakeFeed {
    pub fn new() -> FakeFeed {
        FakeFeed::default()
    }

    pub fn with_stats(mut self, year: i32, kind: StatKind, text: &str) -> FakeFeed {
        self.stats
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .insert((year, kind), text.to_string());
        self
    }

    /// Publishes (or replaces) a season file on a feed that is already in use.
    pub fn set_stats(&self, year: i32, kind: StatKind, text: &str) {
        self.stats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((year, kind), text.to_string());
    }

    pub fn with_players(mut self, text: &str) -> FakeFeed {
        self.players = Some(text.to_string());
        self
    }

    pub fn with_teams(mut self, text: &str) -> FakeFeed {
        self.teams = Some(text.to_string());
        self
    }

    pub fn stats_calls(&self, year: i32, kind: StatKind) -> usize {
        self.stats_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(year, kind))
            .copied()
            .unwrap_or(0)
    }

    pub fn players_calls(&self) -> usize {
        self.players_calls.load(Ordering::SeqCst)
    }

    pub fn teams_calls(&self) -> usize {
        self.teams_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatsFeed for FakeFeed {
    async fn fetch_stats(&self, year: i32, kind: StatKind) -> Result<String, FeedError> {
        *self.stats_calls.lock().unwrap_or_else(|e| e.into_inner()).entry((year, kind)).or_default() += 1;
        // Let concurrent callers interleave like a real request would
        tokio::task::yield_now().await;

        self.stats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(year, kind))
            .cloned()
            .ok_or_else(|| FeedError::NotFound(format!("{} {}", kind, year)))
    }

    async fn fetch_players(&self) -> Result<String, FeedError> {
        self.players_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        self.players
            .clone()
            .ok_or_else(|| FeedError::NotFound("players".to_string()))
    }

    async fn fetch_teams(&self) -> Result<String, FeedError> {
        self.teams_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        self.teams
            .clone()
            .ok_or_else(|| FeedError::NotFound("teams".to_string()))
    }
}

/// A player born in March of `birth_year`, listed as a pitcher or a center fielder.
pub fn generate_player(id: i32, birth_year: i32, pitcher: bool) -> Player {
    Player {
        id,
        name: format!("Player {}", id),
        team_id: None,
        organization_id: None,
        level: None,
        position: Some(if pitcher { 1 } else { 8 }),
        role: None,
        date_of_birth: NaiveDate::from_ymd_opt(birth_year, 3, 15),
        age: None
    }
}

fn rng_for(player_id: i32, year: i32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(((player_id as u64) << 16) ^ year as u64)
}

/// A plausible full season line. Values are seeded by player and year so
/// repeated calls agree.
pub fn generate_pitching_stat(player_id: i32, year: i32, level: Level) -> PitchingStat {
    let mut rng = rng_for(player_id, year);

    let outs: u32 = rng.random_range(150..=600);
    let innings = outs as f64 / 3.0;
    let g: u32 = rng.random_range(10..=35);

    PitchingStat {
        player_id,
        name: None,
        year,
        team_id: 1,
        level,
        outs,
        k: (innings * rng.random_range(6.0..10.0) / 9.0) as u32,
        bb: (innings * rng.random_range(2.0..4.0) / 9.0) as u32,
        hra: (innings * rng.random_range(0.7..1.4) / 9.0) as u32,
        er: (innings * rng.random_range(3.0..5.0) / 9.0) as u32,
        h: (innings * rng.random_range(7.5..9.5) / 9.0) as u32,
        gs: rng.random_range(0..=g),
        g,
        war: rng.random_range(-0.5..4.0)
    }
}

pub fn generate_batting_stat(player_id: i32, year: i32, level: Level) -> BattingStat {
    let mut rng = rng_for(player_id, year);

    let pa: u32 = rng.random_range(200..=650);
    let bb = (pa as f64 * rng.random_range(0.06..0.11)) as u32;
    let ab = pa - bb;
    let h = (ab as f64 * rng.random_range(0.22..0.30)) as u32;
    let hr = (pa as f64 * rng.random_range(0.01..0.05)) as u32;
    let d = (h as f64 * 0.2) as u32;

    BattingStat {
        player_id,
        name: None,
        year,
        team_id: 1,
        level,
        pa,
        ab,
        h,
        d,
        t: rng.random_range(0..=3),
        hr,
        bb,
        k: (pa as f64 * rng.random_range(0.15..0.28)) as u32,
        sb: rng.random_range(0..=15),
        cs: rng.random_range(0..=5),
        war: rng.random_range(-0.5..4.0)
    }
}

/// A projection with the given star ratings and no component detail.
pub fn generate_projection(
    player_id: i32,
    team_id: i32,
    level: Level,
    player_type: PlayerType,
    true_rating: f64,
    true_future_rating: f64,
    age: Option<f64>
) -> PlayerProjection {
    PlayerProjection {
        player_id,
        name: format!("Player {}", player_id),
        team_id: Some(team_id),
        level: Some(level),
        age,
        player_type,
        true_rating: RatingResult::new(true_rating * 20.0, true_rating),
        true_future_rating: RatingResult::new(true_future_rating * 20.0, true_future_rating),
        components: Vec::new(),
        current_stat: 0.0,
        peak_stat: 0.0,
        projected_war: 0.0,
        established: level.is_mlb(),
        sources: EvidenceSources {
            scouting: true,
            stats: level.is_mlb()
        }
    }
}
