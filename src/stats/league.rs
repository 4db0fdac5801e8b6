use crate::{
    model::{config::LeagueDefaults, structures::level::Level},
    stats::stats_structs::{BattingStat, PitchingStat}
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// League-wide run environment for one season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueConstants {
    pub fip_constant: f64,
    pub era: f64,
    pub woba: f64,
    pub k9: Option<f64>,
    pub bb9: Option<f64>,
    pub hr9: Option<f64>
}

impl LeagueConstants {
    pub fn from_defaults(defaults: &LeagueDefaults) -> LeagueConstants {
        LeagueConstants {
            fip_constant: defaults.fip_constant,
            era: defaults.era,
            woba: defaults.woba,
            k9: None,
            bb9: None,
            hr9: None
        }
    }

    /// Derives the FIP constant (`lgERA - core FIP`) from MLB rows, falling back
    /// to `defaults` when the season has no MLB innings.
    pub fn from_pitching(stats: &[PitchingStat], defaults: &LeagueDefaults) -> LeagueConstants {
        let (mut outs, mut k, mut bb, mut hr, mut er) = (0u64, 0u64, 0u64, 0u64, 0u64);
        for stat in stats.iter().filter(|s| s.level.is_mlb()) {
            outs += stat.outs as u64;
            k += stat.k as u64;
            bb += stat.bb as u64;
            hr += stat.hra as u64;
            er += stat.er as u64;
        }

        if outs == 0 {
            warn!("No MLB innings to derive league constants from, using defaults");
            return LeagueConstants::from_defaults(defaults);
        }

        let per_nine = |count: u64| count as f64 * 27.0 / outs as f64;
        let (k9, bb9, hr9, era) = (per_nine(k), per_nine(bb), per_nine(hr), per_nine(er));
        let core = (13.0 * hr9 + 3.0 * bb9 - 2.0 * k9) / 9.0;

        LeagueConstants {
            fip_constant: era - core,
            era,
            woba: defaults.woba,
            k9: Some(k9),
            bb9: Some(bb9),
            hr9: Some(hr9)
        }
    }

    /// Adds the season's league wOBA from MLB batting rows.
    pub fn with_batting(mut self, stats: &[BattingStat], defaults: &LeagueDefaults) -> LeagueConstants {
        let mlb: Vec<&BattingStat> = stats.iter().filter(|s| s.level == Level::Mlb).collect();
        let pa: u32 = mlb.iter().map(|s| s.pa).sum();
        if pa == 0 {
            return self;
        }

        let total: f64 = mlb.iter().filter_map(|s| s.woba(defaults).map(|w| w * s.pa as f64)).sum();
        self.woba = total / pa as f64;
        self
    }

    /// Identifies the constants a distribution was built against.
    pub fn cache_key(&self) -> String {
        format!("fip{:.3}:era{:.3}:woba{:.4}", self.fip_constant, self.era, self.woba)
    }
}
