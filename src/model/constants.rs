// Engine defaults. Everything here is a tunable parameter surfaced through
// `EngineConfig`; nothing reads these constants directly outside config.rs.

// Scouting grade -> MLB rate (rate = intercept + slope * grade)
pub const K9_INTERCEPT: f64 = 2.07;
pub const K9_SLOPE: f64 = 0.074;
pub const BB9_INTERCEPT: f64 = 5.22;
pub const BB9_SLOPE: f64 = -0.052;
pub const HR9_INTERCEPT: f64 = 2.08;
pub const HR9_SLOPE: f64 = -0.024;
pub const BB_PCT_INTERCEPT: f64 = 0.5;
pub const BB_PCT_SLOPE: f64 = 0.16;
pub const K_PCT_INTERCEPT: f64 = 38.0;
pub const K_PCT_SLOPE: f64 = -0.36;
pub const HR_PCT_INTERCEPT: f64 = -0.8;
pub const HR_PCT_SLOPE: f64 = 0.06;
pub const BABIP_INTERCEPT: f64 = 0.230;
pub const BABIP_SLOPE: f64 = 0.0014;
pub const XBH_INTERCEPT: f64 = 0.012;
pub const XBH_SLOPE: f64 = 0.0008;
pub const SB_INTERCEPT: f64 = -0.008;
pub const SB_SLOPE: f64 = 0.0006;

// League run environment
pub const FIP_CONSTANT: f64 = 3.47;
pub const LEAGUE_ERA: f64 = 4.20;
pub const LEAGUE_WOBA: f64 = 0.315;
pub const WOBA_SCALE: f64 = 1.20;
pub const WOBA_BB: f64 = 0.69;
pub const WOBA_SINGLE: f64 = 0.88;
pub const WOBA_DOUBLE: f64 = 1.24;
pub const WOBA_TRIPLE: f64 = 1.56;
pub const WOBA_HR: f64 = 1.95;
/// Share of extra-base hits that are doubles when splitting a gap rate
pub const DOUBLES_SHARE_OF_XBH: f64 = 0.88;

// Sample weights per level (MLB, AAA, AA, A, Rookie)
pub const LEVEL_SAMPLE_WEIGHTS: [f64; 5] = [1.0, 1.0, 0.8, 0.6, 0.4];
/// Most recent season first
pub const RECENCY_WEIGHTS: [f64; 3] = [5.0, 3.0, 2.0];
/// Scouting never contributes less than this share of a blend
pub const MIN_SCOUTING_WEIGHT: f64 = 0.25;

// Reference population
pub const DISTRIBUTION_YEARS: u32 = 5;
pub const PRIME_AGE_MIN: u32 = 25;
pub const PRIME_AGE_MAX: u32 = 32;
pub const DISTRIBUTION_MIN_OUTS: u32 = 150;
pub const DISTRIBUTION_MIN_PA: u32 = 200;
/// Ages are taken on this day of each season
pub const AGE_REFERENCE_MONTH: u32 = 7;
pub const AGE_REFERENCE_DAY: u32 = 1;

// Development curves
/// Rating points per 100% deviation from the cohort's expected value
pub const DEVELOPMENT_SENSITIVITY: f64 = 30.0;
/// Deviations are bounded to this many cohort dispersions
pub const DEVIATION_DISPERSION_BOUND: f64 = 3.0;

// Current-ability projection
pub const ESTABLISHED_MLB_OUTS: u32 = 450;
pub const ESTABLISHED_MLB_PA: u32 = 600;
pub const PROJECTED_IP_STARTER: f64 = 180.0;
pub const PROJECTED_IP_RELIEVER: f64 = 65.0;
pub const PROJECTED_PA: f64 = 600.0;
pub const REPLACEMENT_FIP_OFFSET: f64 = 1.0;
pub const REPLACEMENT_WOBA_OFFSET: f64 = 0.040;
pub const RUNS_PER_WIN: f64 = 10.0;

// Starter / reliever classification
pub const MIN_GAMES_FOR_ROLE: u32 = 5;
pub const STARTER_GS_SHARE: f64 = 0.5;
pub const STARTER_MIN_STAMINA: f64 = 50.0;
pub const STARTER_MIN_PITCHES: u8 = 3;

// Rankings
pub const PROSPECT_MAX_AGE: f64 = 25.0;
pub const FARM_TOP_PROSPECTS: usize = 10;
pub const ROTATION_SIZE: usize = 5;
pub const BULLPEN_SIZE: usize = 8;
pub const LINEUP_SIZE: usize = 9;
pub const ROTATION_WEIGHT: f64 = 0.40;
pub const BULLPEN_WEIGHT: f64 = 0.15;
pub const LINEUP_WEIGHT: f64 = 0.45;

// League leaders
pub const LEADER_MIN_OUTS: u32 = 300;
pub const LEADER_MIN_PA: u32 = 350;

// Stats repository
pub const CURRENT_YEAR_TTL_HOURS: i64 = 24;
pub const COMBINED_SPLIT_ID: i32 = 1;
