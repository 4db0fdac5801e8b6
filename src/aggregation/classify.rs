use crate::{
    model::{
        config::ClassificationConfig,
        structures::{player_type::PlayerType, scouting_grade::ScoutingGrade}
    },
    stats::stats_structs::{BattingStat, PitchingStat, Player}
};

/// Which piece of evidence decided a player's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationBasis {
    Hitter,
    GamesStarted,
    RosterRole,
    ScoutingProfile,
    Fallback
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub player_type: PlayerType,
    pub basis: ClassificationBasis
}

/// Pitcher or hitter: the listed position wins, then the scouting report's
/// layout, then whichever kind of stats the player has more of.
pub fn is_pitcher(
    player: &Player,
    pitching: &[PitchingStat],
    batting: &[BattingStat],
    scouting: Option<&ScoutingGrade>
) -> bool {
    if player.position.is_some() {
        return player.is_pitcher();
    }
    if let Some(report) = scouting {
        return report.is_pitcher_report();
    }

    let batters_faced: u32 = pitching.iter().map(|s| s.outs + s.h + s.bb).sum();
    let plate_appearances: u32 = batting.iter().map(|s| s.pa).sum();
    batters_faced > plate_appearances
}

/// Starter or reliever, by games-started history, then the current roster
/// role, then the scouting stamina and pitch-mix profile. With none of those
/// a pitcher is treated as a reliever.
pub fn classify_pitcher(
    player: &Player,
    history: &[PitchingStat],
    scouting: Option<&ScoutingGrade>,
    config: &ClassificationConfig
) -> Classification {
    let games: u32 = history.iter().map(|s| s.g).sum();
    if games >= config.min_games {
        let starts: u32 = history.iter().map(|s| s.gs).sum();
        let share = starts as f64 / games as f64;

        return pitcher(share >= config.starter_gs_share, ClassificationBasis::GamesStarted);
    }

    if let Some(role) = player.role {
        return pitcher(role.is_starter(), ClassificationBasis::RosterRole);
    }

    if let Some(report) = scouting {
        if report.stamina.is_some() || report.pitch_count.is_some() {
            let stamina = report.stamina.is_some_and(|s| s >= config.starter_min_stamina);
            let pitches = report.pitch_count.is_some_and(|p| p >= config.starter_min_pitches);

            return pitcher(stamina && pitches, ClassificationBasis::ScoutingProfile);
        }
    }

    pitcher(false, ClassificationBasis::Fallback)
}

fn pitcher(starter: bool, basis: ClassificationBasis) -> Classification {
    Classification {
        player_type: if starter {
            PlayerType::Starter
        } else {
            PlayerType::Reliever
        },
        basis
    }
}

pub fn classify(
    player: &Player,
    pitching: &[PitchingStat],
    batting: &[BattingStat],
    scouting: Option<&ScoutingGrade>,
    config: &ClassificationConfig
) -> Classification {
    if is_pitcher(player, pitching, batting, scouting) {
        classify_pitcher(player, pitching, scouting, config)
    } else {
        Classification {
            player_type: PlayerType::Hitter,
            basis: ClassificationBasis::Hitter
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        aggregation::classify::{classify, ClassificationBasis},
        model::{
            config::EngineConfig,
            structures::{component::Component, level::Level, player_type::PlayerType, scouting_grade::ScoutingGrade}
        },
        stats::stats_structs::{PitchingStat, RosterRole},
        utils::test_utils::{generate_pitching_stat, generate_player}
    };

    #[test]
    fn test_games_started_history_wins() {
        let config = EngineConfig::default().classification;
        let mut player = generate_player(1, 1995, true);
        player.role = Some(RosterRole::Reliever);

        let history = vec![
            PitchingStat {
                g: 30,
                gs: 28,
                ..generate_pitching_stat(1, 2021, Level::Mlb)
            },
            PitchingStat {
                g: 10,
                gs: 2,
                ..generate_pitching_stat(1, 2020, Level::Aaa)
            }
        ];

        let result = classify(&player, &history, &[], None, &config);
        assert_eq!(result.player_type, PlayerType::Starter);
        assert_eq!(result.basis, ClassificationBasis::GamesStarted);
    }

    #[test]
    fn test_roster_role_when_history_is_thin() {
        let config = EngineConfig::default().classification;
        let mut player = generate_player(2, 1995, true);
        player.role = Some(RosterRole::Starter);

        let history = vec![PitchingStat {
            g: 2,
            gs: 0,
            ..generate_pitching_stat(2, 2021, Level::Mlb)
        }];

        let result = classify(&player, &history, &[], None, &config);
        assert_eq!(result.player_type, PlayerType::Starter);
        assert_eq!(result.basis, ClassificationBasis::RosterRole);
    }

    #[test]
    fn test_scouting_profile_then_fallback() {
        let config = EngineConfig::default().classification;
        let player = generate_player(3, 2001, true);

        let mut report = ScoutingGrade::new(3, "Young Arm");
        report.potential.insert(Component::Stuff, 55.0);
        report.stamina = Some(60.0);
        report.pitch_count = Some(4);

        let result = classify(&player, &[], &[], Some(&report), &config);
        assert_eq!(result.player_type, PlayerType::Starter);
        assert_eq!(result.basis, ClassificationBasis::ScoutingProfile);

        report.pitch_count = Some(2);
        assert_eq!(
            classify(&player, &[], &[], Some(&report), &config).player_type,
            PlayerType::Reliever
        );

        let result = classify(&player, &[], &[], None, &config);
        assert_eq!(result.player_type, PlayerType::Reliever);
        assert_eq!(result.basis, ClassificationBasis::Fallback);
    }

    #[test]
    fn test_hitters() {
        let config = EngineConfig::default().classification;
        let player = generate_player(4, 1995, false);

        let result = classify(&player, &[], &[], None, &config);
        assert_eq!(result.player_type, PlayerType::Hitter);
    }
}
