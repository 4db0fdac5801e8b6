//! Season stats, fetched once and cached at two levels.
//!
//! The in-memory map answers repeat requests within a process; the persisted
//! store carries completed seasons across runs. Completed seasons never expire.
//! The season in progress expires after the configured time-to-live.

use crate::{
    model::{
        constants::CURRENT_YEAR_TTL_HOURS,
        structures::stat_kind::StatKind
    },
    stats::{
        clock::{Clock, SystemClock},
        feed::{FeedError, StatsFeed},
        normalize::{combine_stints, combine_stints_by_team},
        stats_structs::{Player, SeasonRow, Team}
    },
    store::{get_json, set_json, KeyValueStore},
    utils::delimited::{detect_delimiter, parse_delimited, ParseError}
};
use futures::future::join_all;
use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard}
};
use tracing::{debug, info, warn};

/// Persisted value for a completed season's timestamp key.
const PERMANENT: i64 = 0;

#[derive(Debug, Clone, Copy)]
pub struct RepositoryConfig {
    pub ttl: chrono::Duration
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            ttl: chrono::Duration::hours(CURRENT_YEAR_TTL_HOURS)
        }
    }
}

struct MemoryEntry {
    rows: Arc<dyn Any + Send + Sync>,
    /// `None` for completed seasons
    expires_at: Option<i64>
}

pub fn stats_key(kind: StatKind, year: i32) -> String {
    format!("stats:{}:{}", kind.as_str(), year)
}

fn timestamp_key(key: &str) -> String {
    format!("{}:ts", key)
}

pub struct StatsRepository {
    feed: Arc<dyn StatsFeed>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: RepositoryConfig,
    seasons: Mutex<HashMap<(StatKind, i32), MemoryEntry>>,
    players: Mutex<Option<Arc<Vec<Player>>>>,
    teams: Mutex<Option<Arc<Vec<Team>>>>
}

impl StatsRepository {
    pub fn new(feed: Arc<dyn StatsFeed>, store: Arc<dyn KeyValueStore>) -> StatsRepository {
        StatsRepository::with_clock(feed, store, Arc::new(SystemClock), RepositoryConfig::default())
    }

    pub fn with_clock(
        feed: Arc<dyn StatsFeed>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: RepositoryConfig
    ) -> StatsRepository {
        StatsRepository {
            feed,
            store,
            clock,
            config,
            seasons: Mutex::new(HashMap::new()),
            players: Mutex::new(None),
            teams: Mutex::new(None)
        }
    }

    pub fn current_year(&self) -> i32 {
        self.clock.current_year()
    }

    fn seasons(&self) -> MutexGuard<'_, HashMap<(StatKind, i32), MemoryEntry>> {
        self.seasons.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// One row per player and level for `year`, traded players' stints combined.
    pub async fn get_season_stats<T: SeasonRow>(&self, year: i32) -> Vec<T> {
        combine_stints(self.season_rows::<T>(year).await.as_ref().clone())
    }

    /// One row per player, level and team for `year`.
    pub async fn get_season_stats_by_team<T: SeasonRow>(&self, year: i32) -> Vec<T> {
        combine_stints_by_team(self.season_rows::<T>(year).await.as_ref().clone())
    }

    /// `years_back` seasons ending at `end_year`, grouped by player, most recent season first.
    pub async fn get_multi_year_stats<T: SeasonRow>(&self, end_year: i32, years_back: u32) -> HashMap<i32, Vec<T>> {
        let years: Vec<i32> = (0..years_back as i32).map(|i| end_year - i).collect();
        let seasons = join_all(years.iter().map(|year| self.get_season_stats::<T>(*year))).await;

        let mut by_player: HashMap<i32, Vec<T>> = HashMap::new();
        // `years` runs newest to oldest, so pushes land in that order
        for rows in seasons {
            for row in rows {
                by_player.entry(row.player_id()).or_default().push(row);
            }
        }

        by_player
    }

    /// Drops both kinds of `year` from memory and from the persisted store.
    pub async fn invalidate(&self, year: i32) {
        for kind in [StatKind::Pitching, StatKind::Batting] {
            self.seasons().remove(&(kind, year));
            self.clear_persisted(&stats_key(kind, year)).await;
        }
    }

    pub async fn get_players(&self) -> Arc<Vec<Player>> {
        if let Some(players) = self.players.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return players;
        }

        let players = match self.fetch_players().await {
            Ok(players) => Arc::new(players),
            Err(e) => {
                warn!("Failed to load player roster: {}", e);
                return Arc::new(Vec::new());
            }
        };

        *self.players.lock().unwrap_or_else(|e| e.into_inner()) = Some(players.clone());
        players
    }

    pub async fn get_teams(&self) -> Arc<Vec<Team>> {
        if let Some(teams) = self.teams.lock().unwrap_or_else(|e| e.into_inner()).clone() {
            return teams;
        }

        let teams = match self.fetch_teams().await {
            Ok(teams) => Arc::new(teams),
            Err(e) => {
                warn!("Failed to load teams: {}", e);
                return Arc::new(Vec::new());
            }
        };

        *self.teams.lock().unwrap_or_else(|e| e.into_inner()) = Some(teams.clone());
        teams
    }

    async fn fetch_players(&self) -> Result<Vec<Player>, FeedError> {
        let text = self.feed.fetch_players().await?;
        let table = parse_delimited(&text, detect_delimiter(&text))?;

        Ok(table
            .rows()
            .map(|row| Player::from_row(&row))
            .collect::<Result<Vec<Player>, ParseError>>()?)
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>, FeedError> {
        let text = self.feed.fetch_teams().await?;
        let table = parse_delimited(&text, detect_delimiter(&text))?;

        Ok(table
            .rows()
            .map(|row| Team::from_row(&row))
            .collect::<Result<Vec<Team>, ParseError>>()?)
    }

    /// Split-filtered, name-joined rows for `year`, before stint combination.
    async fn season_rows<T: SeasonRow>(&self, year: i32) -> Arc<Vec<T>> {
        if let Some(rows) = self.from_memory::<T>(year) {
            return rows;
        }

        let key = stats_key(T::KIND, year);
        if let Some(rows) = self.from_store::<T>(&key).await {
            debug!("Loaded {} from persisted cache", key);
            return self.remember(year, rows);
        }

        let mut rows = match self.fetch_rows::<T>(year).await {
            Ok(rows) => rows,
            Err(e) => {
                // Not cached: the next request tries the feed again
                warn!("Failed to load {}: {}", key, e);
                return Arc::new(Vec::new());
            }
        };

        let players = self.get_players().await;
        let names: HashMap<i32, &str> = players.iter().map(|p| (p.id, p.name.as_str())).collect();
        for row in rows.iter_mut() {
            if let Some(name) = names.get(&row.player_id()) {
                row.set_name(name.to_string());
            }
        }

        info!("Fetched {} {} rows for {}", rows.len(), T::KIND, year);
        self.persist(&key, year, &rows).await;
        self.remember(year, rows)
    }

    async fn fetch_rows<T: SeasonRow>(&self, year: i32) -> Result<Vec<T>, FeedError> {
        let text = self.feed.fetch_stats(year, T::KIND).await?;
        Ok(parse_rows::<T>(&text)?)
    }

    fn is_permanent(&self, year: i32) -> bool {
        year < self.current_year()
    }

    fn from_memory<T: SeasonRow>(&self, year: i32) -> Option<Arc<Vec<T>>> {
        let mut seasons = self.seasons();
        let entry = seasons.get(&(T::KIND, year))?;

        if entry.expires_at.is_some_and(|at| self.clock.now_millis() >= at) {
            seasons.remove(&(T::KIND, year));
            return None;
        }

        entry.rows.clone().downcast::<Vec<T>>().ok()
    }

    fn remember<T: SeasonRow>(&self, year: i32, rows: Vec<T>) -> Arc<Vec<T>> {
        let rows = Arc::new(rows);
        let expires_at = if self.is_permanent(year) {
            None
        } else {
            Some(self.clock.now_millis() + self.config.ttl.num_milliseconds())
        };

        self.seasons().insert(
            (T::KIND, year),
            MemoryEntry {
                rows: rows.clone(),
                expires_at
            }
        );

        rows
    }

    /// Persisted rows, or `None` when absent, expired or unreadable. Anything
    /// unusable is cleared so the season is rebuilt from the feed.
    async fn from_store<T: SeasonRow>(&self, key: &str) -> Option<Vec<T>> {
        let ts_key = timestamp_key(key);

        let timestamp = match self.store.get(&ts_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", ts_key, e);
                self.clear_persisted(key).await;
                return None;
            }
        };

        let Ok(timestamp) = timestamp.trim().parse::<i64>() else {
            warn!("Clearing {} with unreadable timestamp '{}'", key, timestamp);
            self.clear_persisted(key).await;
            return None;
        };

        if timestamp != PERMANENT && self.clock.now_millis() - timestamp >= self.config.ttl.num_milliseconds() {
            debug!("{} expired", key);
            self.clear_persisted(key).await;
            return None;
        }

        match get_json::<Vec<T>>(self.store.as_ref(), key).await {
            Ok(Some(rows)) => Some(rows),
            Ok(None) => {
                self.clear_persisted(key).await;
                None
            }
            Err(e) => {
                warn!("Clearing corrupt cache entry {}: {}", key, e);
                self.clear_persisted(key).await;
                None
            }
        }
    }

    async fn persist<T: SeasonRow>(&self, key: &str, year: i32, rows: &[T]) {
        let timestamp = if self.is_permanent(year) {
            PERMANENT
        } else {
            self.clock.now_millis()
        };

        if let Err(e) = set_json(self.store.as_ref(), key, rows).await {
            warn!("Keeping {} in memory only: {}", key, e);
            return;
        }

        if let Err(e) = self.store.set(&timestamp_key(key), timestamp.to_string()).await {
            warn!("Keeping {} in memory only: {}", key, e);
            let _ = self.store.remove(key).await;
        }
    }

    async fn clear_persisted(&self, key: &str) {
        for k in [key.to_string(), timestamp_key(key)] {
            if let Err(e) = self.store.remove(&k).await {
                warn!("Failed to clear {}: {}", k, e);
            }
        }
    }
}

/// Parses a stats document, dropping rows outside the combined split.
pub fn parse_rows<T: SeasonRow>(text: &str) -> Result<Vec<T>, ParseError> {
    let table = parse_delimited(text, detect_delimiter(text))?;

    let mut rows = Vec::with_capacity(table.len());
    for row in table.rows() {
        if let Some(parsed) = T::from_row(&row)? {
            rows.push(parsed);
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use crate::{
        model::structures::stat_kind::StatKind,
        stats::{
            clock::FixedClock,
            repository::{stats_key, RepositoryConfig, StatsRepository},
            stats_structs::{BattingStat, PitchingStat}
        },
        store::{KeyValueStore, MemoryStore},
        utils::test_utils::FakeFeed
    };
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    const PITCHING_2019: &str = "player_id,year,team_id,level_id,split_id,ip,k,bb,hra,er,h,gs,g,war\n\
        1,2019,3,1,1,50.1,40,10,5,20,45,8,10,0.8\n\
        1,2019,8,1,1,20.2,18,5,2,8,20,3,4,0.4\n\
        1,2019,3,1,2,10.0,5,5,1,3,9,1,2,0.1\n\
        2,2019,3,2,1,80.0,70,30,9,40,75,14,15,0.0\n";

    const BATTING_2021: &str = "player_id,year,team_id,level_id,split_id,pa,ab,h,d,t,hr,bb,k,sb,cs,war\n\
        5,2021,3,1,1,400,360,100,20,2,12,35,80,5,2,1.9\n";

    const PLAYERS: &str = "player_id,name,team_id,level,position\n1,Ace Arm,3,mlb,1\n2,Farm Arm,12,aaa,1\n5,Big Bat,3,mlb,3\n";

    fn setup(store: Arc<MemoryStore>) -> (Arc<FakeFeed>, Arc<FixedClock>, StatsRepository) {
        let feed = Arc::new(
            FakeFeed::new()
                .with_stats(2019, StatKind::Pitching, PITCHING_2019)
                .with_stats(2021, StatKind::Batting, BATTING_2021)
                .with_players(PLAYERS)
        );
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()));
        let repository = StatsRepository::with_clock(feed.clone(), store, clock.clone(), RepositoryConfig::default());

        (feed, clock, repository)
    }

    #[tokio::test]
    async fn test_season_is_combined_filtered_and_named() {
        let (_, _, repository) = setup(Arc::new(MemoryStore::new()));

        let stats = repository.get_season_stats::<PitchingStat>(2019).await;
        assert_eq!(stats.len(), 2);

        let ace = stats.iter().find(|s| s.player_id == 1).unwrap();
        assert_eq!(ace.ip_display(), "71.0");
        assert_eq!(ace.k, 58);
        assert_eq!(ace.bb, 15);
        assert_eq!(ace.name.as_deref(), Some("Ace Arm"));

        let by_team = repository.get_season_stats_by_team::<PitchingStat>(2019).await;
        assert_eq!(by_team.len(), 3);
    }

    #[tokio::test]
    async fn test_completed_season_is_cached_permanently() {
        let store = Arc::new(MemoryStore::new());
        let (feed, clock, repository) = setup(store.clone());

        repository.get_season_stats::<PitchingStat>(2019).await;
        clock.advance(Duration::days(400));
        repository.get_season_stats::<PitchingStat>(2019).await;

        assert_eq!(feed.stats_calls(2019, StatKind::Pitching), 1);
        assert_eq!(
            store.get("stats:pitching:2019:ts").await.unwrap().as_deref(),
            Some("0")
        );

        // A fresh process reads the persisted copy instead of the feed
        let (second_feed, _, second) = setup(store.clone());
        assert_eq!(second.get_season_stats::<PitchingStat>(2019).await.len(), 2);
        assert_eq!(second_feed.stats_calls(2019, StatKind::Pitching), 0);
    }

    #[tokio::test]
    async fn test_current_season_expires() {
        let store = Arc::new(MemoryStore::new());
        let (feed, clock, repository) = setup(store.clone());

        repository.get_season_stats::<BattingStat>(2021).await;
        clock.advance(Duration::hours(23));
        repository.get_season_stats::<BattingStat>(2021).await;
        assert_eq!(feed.stats_calls(2021, StatKind::Batting), 1);

        clock.advance(Duration::hours(2));
        repository.get_season_stats::<BattingStat>(2021).await;
        assert_eq!(feed.stats_calls(2021, StatKind::Batting), 2);

        let ts = store.get("stats:batting:2021:ts").await.unwrap().unwrap();
        assert_ne!(ts, "0");
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_rebuilt() {
        let store = Arc::new(MemoryStore::new());
        store.set(&stats_key(StatKind::Pitching, 2019), "{broken".to_string()).await.unwrap();
        store.set("stats:pitching:2019:ts", "0".to_string()).await.unwrap();

        let (feed, _, repository) = setup(store.clone());
        let stats = repository.get_season_stats::<PitchingStat>(2019).await;

        assert_eq!(stats.len(), 2);
        assert_eq!(feed.stats_calls(2019, StatKind::Pitching), 1);
        // Rewritten with a valid payload
        assert!(store.get("stats:pitching:2019").await.unwrap().unwrap().starts_with('['));
    }

    #[tokio::test]
    async fn test_missing_year_is_empty_and_retried() {
        let (feed, _, repository) = setup(Arc::new(MemoryStore::new()));

        assert!(repository.get_season_stats::<PitchingStat>(2015).await.is_empty());
        assert!(repository.get_season_stats::<PitchingStat>(2015).await.is_empty());
        assert_eq!(feed.stats_calls(2015, StatKind::Pitching), 2);
    }

    #[tokio::test]
    async fn test_quota_exceeded_keeps_memory_copy() {
        let store = Arc::new(MemoryStore::with_quota(64));
        let (feed, _, repository) = setup(store.clone());

        assert_eq!(repository.get_season_stats::<PitchingStat>(2019).await.len(), 2);
        assert_eq!(repository.get_season_stats::<PitchingStat>(2019).await.len(), 2);

        assert_eq!(feed.stats_calls(2019, StatKind::Pitching), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_multi_year_most_recent_first() {
        let feed = Arc::new(
            FakeFeed::new()
                .with_stats(2020, StatKind::Pitching, "player_id,year,level_id,ip,k\n1,2020,1,30.0,30\n")
                .with_stats(2019, StatKind::Pitching, "player_id,year,level_id,ip,k\n1,2019,2,60.0,50\n")
        );
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()));
        let repository = StatsRepository::with_clock(
            feed,
            Arc::new(MemoryStore::new()),
            clock,
            RepositoryConfig::default()
        );

        let by_player = repository.get_multi_year_stats::<PitchingStat>(2020, 3).await;
        let years: Vec<i32> = by_player[&1].iter().map(|s| s.year).collect();

        assert_eq!(years, vec![2020, 2019]);
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let store = Arc::new(MemoryStore::new());
        let (feed, _, repository) = setup(store.clone());

        repository.get_season_stats::<PitchingStat>(2019).await;
        repository.invalidate(2019).await;
        assert!(!store.contains_key("stats:pitching:2019"));

        repository.get_season_stats::<PitchingStat>(2019).await;
        assert_eq!(feed.stats_calls(2019, StatKind::Pitching), 2);
    }
}
