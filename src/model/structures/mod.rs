pub mod component;
pub mod level;
pub mod player_projection;
pub mod player_type;
pub mod rating_result;
pub mod reference_distribution;
pub mod scouting_grade;
pub mod stat_kind;
