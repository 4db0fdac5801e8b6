//! Rating model: scouting/stat blending, development curves and the
//! rating scales layered on top of them.

pub mod blender;
pub mod config;
pub mod constants;
pub mod development;
pub mod distribution;
pub mod percentile;
pub mod projection;
pub mod rating_converter;
pub mod structures;
