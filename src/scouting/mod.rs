//! Scouting uploads: parsing and persistence.

pub mod parser;
pub mod repository;

pub use parser::{parse_hitter_scouting, parse_pitcher_scouting, ScoutingError};
pub use repository::{ScoutingKind, ScoutingRepository, ScoutingSet, ScoutingUpload};
