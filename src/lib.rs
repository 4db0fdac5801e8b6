pub mod aggregation;
pub mod args;
pub mod model;
pub mod scouting;
pub mod stats;
pub mod store;
pub mod utils;
