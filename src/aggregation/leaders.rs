use crate::{
    model::config::{LeaderConfig, LeagueDefaults},
    stats::stats_structs::{BattingStat, PitchingStat, Team}
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum LeaderCategory {
    // Pitching
    Strikeouts,
    Walks,
    HomeRunsAllowed,
    Fip,
    Era,
    Innings,
    // Batting
    HomeRuns,
    Avg,
    StolenBases,
    Hits,
    /// Pitchers and hitters together
    War
}

impl LeaderCategory {
    pub fn is_pitching(&self) -> bool {
        matches!(
            self,
            LeaderCategory::Strikeouts
                | LeaderCategory::Walks
                | LeaderCategory::HomeRunsAllowed
                | LeaderCategory::Fip
                | LeaderCategory::Era
                | LeaderCategory::Innings
        )
    }

    /// Fewest walks, homers allowed and runs lead their boards.
    pub fn lower_is_better(&self) -> bool {
        matches!(
            self,
            LeaderCategory::Walks | LeaderCategory::HomeRunsAllowed | LeaderCategory::Fip | LeaderCategory::Era
        )
    }

    /// Only boards where a tiny sample could lead need a qualification floor.
    pub fn needs_qualification(&self) -> bool {
        self.lower_is_better() || *self == LeaderCategory::Avg
    }
}

/// One line of a leader board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderEntry {
    pub rank: usize,
    pub player_id: i32,
    pub name: String,
    pub team: String,
    pub value: f64,
    pub display: String
}

impl LeaderEntry {
    /// `"1. Name (TEAM): value"`
    pub fn line(&self) -> String {
        format!("{}. {} ({}): {}", self.rank, self.name, self.team, self.display)
    }
}

fn format_value(category: LeaderCategory, value: f64, pitching: Option<&PitchingStat>) -> String {
    match category {
        LeaderCategory::Fip | LeaderCategory::Era => format!("{:.2}", value),
        LeaderCategory::War => format!("{:.1}", value),
        LeaderCategory::Avg => {
            let formatted = format!("{:.3}", value);
            formatted.strip_prefix('0').map(str::to_string).unwrap_or(formatted)
        }
        LeaderCategory::Innings => pitching
            .map(|s| s.ip_display())
            .unwrap_or_else(|| format!("{:.1}", value)),
        _ => format!("{}", value as i64)
    }
}

struct Candidate<'a> {
    player_id: i32,
    name: Option<&'a str>,
    team_id: i32,
    value: f64,
    pitching: Option<&'a PitchingStat>
}

fn pitching_value(category: LeaderCategory, stat: &PitchingStat, fip_constant: f64) -> Option<f64> {
    match category {
        LeaderCategory::Strikeouts => Some(stat.k as f64),
        LeaderCategory::Walks => Some(stat.bb as f64),
        LeaderCategory::HomeRunsAllowed => Some(stat.hra as f64),
        LeaderCategory::Fip => stat.fip(fip_constant),
        LeaderCategory::Era => stat.era(),
        LeaderCategory::Innings => Some(stat.innings()),
        LeaderCategory::War => Some(stat.war),
        _ => None
    }
}

fn batting_value(category: LeaderCategory, stat: &BattingStat) -> Option<f64> {
    match category {
        LeaderCategory::HomeRuns => Some(stat.hr as f64),
        LeaderCategory::Avg => stat.avg(),
        LeaderCategory::StolenBases => Some(stat.sb as f64),
        LeaderCategory::Hits => Some(stat.h as f64),
        LeaderCategory::War => Some(stat.war),
        _ => None
    }
}

/// The top `limit` major leaguers in `category` for one season. Rate boards
/// only consider players over the qualification floor.
pub fn league_leaders(
    category: LeaderCategory,
    pitching: &[PitchingStat],
    batting: &[BattingStat],
    teams: &[Team],
    league: &LeagueDefaults,
    config: &LeaderConfig,
    limit: usize
) -> Vec<LeaderEntry> {
    let qualified_pitcher = |s: &PitchingStat| !category.needs_qualification() || s.outs >= config.min_outs;
    let qualified_hitter = |s: &BattingStat| !category.needs_qualification() || s.pa >= config.min_pa;

    let mut candidates = Vec::new();
    if category.is_pitching() || category == LeaderCategory::War {
        candidates.extend(
            pitching
                .iter()
                .filter(|s| s.level.is_mlb() && qualified_pitcher(s))
                .filter_map(|s| {
                    Some(Candidate {
                        player_id: s.player_id,
                        name: s.name.as_deref(),
                        team_id: s.team_id,
                        value: pitching_value(category, s, league.fip_constant)?,
                        pitching: Some(s)
                    })
                })
        );
    }
    if !category.is_pitching() {
        candidates.extend(
            batting
                .iter()
                .filter(|s| s.level.is_mlb() && qualified_hitter(s))
                .filter_map(|s| {
                    Some(Candidate {
                        player_id: s.player_id,
                        name: s.name.as_deref(),
                        team_id: s.team_id,
                        value: batting_value(category, s)?,
                        pitching: None
                    })
                })
        );
    }

    let abbrs: HashMap<i32, &str> = teams.iter().map(|t| (t.id, t.abbr.as_str())).collect();

    candidates
        .into_iter()
        .sorted_by(|a, b| {
            let order = if category.lower_is_better() {
                a.value.total_cmp(&b.value)
            } else {
                b.value.total_cmp(&a.value)
            };
            order.then(a.player_id.cmp(&b.player_id))
        })
        .take(limit)
        .enumerate()
        .map(|(idx, c)| LeaderEntry {
            rank: idx + 1,
            player_id: c.player_id,
            name: c
                .name
                .map(str::to_string)
                .unwrap_or_else(|| format!("Player {}", c.player_id)),
            team: abbrs
                .get(&c.team_id)
                .map(|a| a.to_string())
                .unwrap_or_else(|| "FA".to_string()),
            value: c.value,
            display: format_value(category, c.value, c.pitching)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        aggregation::leaders::{league_leaders, LeaderCategory},
        model::{config::EngineConfig, structures::level::Level},
        stats::stats_structs::{BattingStat, PitchingStat, Team},
        utils::test_utils::{generate_batting_stat, generate_pitching_stat}
    };

    fn teams() -> Vec<Team> {
        vec![Team {
            id: 10,
            name: "Capital City".to_string(),
            abbr: "CAP".to_string(),
            parent_team_id: None,
            level: Some(Level::Mlb)
        }]
    }

    #[test]
    fn test_strikeout_board() {
        let config = EngineConfig::default();
        let pitching = vec![
            PitchingStat {
                name: Some("Ace".to_string()),
                team_id: 10,
                k: 250,
                ..generate_pitching_stat(1, 2021, Level::Mlb)
            },
            PitchingStat {
                name: Some("Deuce".to_string()),
                team_id: 10,
                k: 180,
                ..generate_pitching_stat(2, 2021, Level::Mlb)
            },
            PitchingStat {
                k: 400,
                ..generate_pitching_stat(3, 2021, Level::Aaa)
            }
        ];

        let board = league_leaders(
            LeaderCategory::Strikeouts,
            &pitching,
            &[],
            &teams(),
            &config.league,
            &config.leaders,
            5
        );

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].line(), "1. Ace (CAP): 250");
        assert_eq!(board[1].line(), "2. Deuce (CAP): 180");
    }

    #[test]
    fn test_rate_board_requires_qualification() {
        let config = EngineConfig::default();
        let pitching = vec![
            PitchingStat {
                name: Some("Workhorse".to_string()),
                team_id: 10,
                outs: 600,
                er: 60,
                ..generate_pitching_stat(1, 2021, Level::Mlb)
            },
            PitchingStat {
                name: Some("Cameo".to_string()),
                outs: 9,
                er: 0,
                ..generate_pitching_stat(2, 2021, Level::Mlb)
            }
        ];

        let board = league_leaders(LeaderCategory::Era, &pitching, &[], &teams(), &config.league, &config.leaders, 5);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].line(), "1. Workhorse (CAP): 2.70");
    }

    #[test]
    fn test_average_formatting() {
        let config = EngineConfig::default();
        let batting = vec![BattingStat {
            name: Some("Slap Hitter".to_string()),
            team_id: 99,
            pa: 600,
            ab: 500,
            h: 160,
            ..generate_batting_stat(5, 2021, Level::Mlb)
        }];

        let board = league_leaders(LeaderCategory::Avg, &[], &batting, &teams(), &config.league, &config.leaders, 5);

        assert_eq!(board[0].line(), "1. Slap Hitter (FA): .320");
    }
}
