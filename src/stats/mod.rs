//! Stats Repository: season feeds, stint combination and caching.

pub mod clock;
pub mod feed;
pub mod league;
pub mod normalize;
pub mod repository;
pub mod stats_structs;

pub use feed::{FeedError, HttpStatsFeed, StatsFeed};
pub use league::LeagueConstants;
pub use repository::{RepositoryConfig, StatsRepository};
pub use stats_structs::{BattingStat, PitchingStat, Player, SeasonRow, Team};
