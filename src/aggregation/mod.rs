//! League-wide views built on top of per-player projections.

pub mod classify;
pub mod leaders;
pub mod rankings;
pub mod single_flight;
pub mod snapshot;

pub use leaders::{LeaderCategory, LeaderEntry};
pub use rankings::{FarmRanking, PowerRanking};
pub use snapshot::{ProjectionSnapshot, SnapshotError, SnapshotService};
