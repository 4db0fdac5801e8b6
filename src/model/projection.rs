//! The per-player rating chain.
//!
//! Ceiling: blend potential grades with every observed level, read the blended
//! rates back as grades, fold them into FIP or wOBA and place that against the
//! reference population for the True Future Rating.
//!
//! Present: established major leaguers blend current grades with their MLB
//! record alone; everyone else is placed on a development curve. The True
//! Rating follows the same aggregate path and never exceeds the ceiling.

use crate::{
    model::{
        blender::{blend_evidence, Observation, ObservedSample},
        config::{EngineConfig, LeagueDefaults},
        constants::{AGE_REFERENCE_DAY, AGE_REFERENCE_MONTH},
        development::{develop_player, DevelopmentInput},
        distribution::DistributionSet,
        percentile::to_percentile,
        rating_converter::{grade_to_rate, rate_to_grade, rating_result},
        structures::{
            component::{Component, Metric},
            level::Level,
            player_projection::{ComponentRating, EvidenceSources, PlayerProjection},
            player_type::PlayerType,
            rating_result::RatingResult,
            scouting_grade::ScoutingGrade
        }
    },
    stats::{
        league::LeagueConstants,
        stats_structs::{fip_from_rates, season_reference_date, BattingStat, PitchingStat, Player}
    }
};
use std::collections::BTreeMap;
use tracing::warn;

/// Shared, read-only inputs for rating every player of one season.
#[derive(Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub year: i32,
    pub config: &'a EngineConfig,
    pub league: &'a LeagueConstants,
    pub distributions: &'a DistributionSet
}

/// A player's season lines across levels and years.
#[derive(Debug, Clone, Copy)]
pub enum SeasonLines<'a> {
    Pitching(&'a [PitchingStat]),
    Batting(&'a [BattingStat])
}

impl SeasonLines<'_> {
    fn observations(&self, component: Component, year: i32, league: &LeagueDefaults, mlb_only: bool) -> Vec<Observation> {
        let metric = component.metric();
        let observation = |rate: Option<f64>, sample: f64, level: Level, season: i32| {
            let seasons_ago = usize::try_from(year - season).ok()?;
            if mlb_only && level != Level::Mlb {
                return None;
            }

            Some(Observation {
                rate: rate?,
                sample,
                level,
                seasons_ago
            })
        };

        match self {
            SeasonLines::Pitching(lines) => lines
                .iter()
                .filter_map(|s| observation(s.rate(metric, league.fip_constant), s.innings(), s.level, s.year))
                .collect(),
            SeasonLines::Batting(lines) => lines
                .iter()
                .filter_map(|s| observation(s.rate(metric, league), s.pa as f64, s.level, s.year))
                .collect()
        }
    }

    /// MLB sample within the recency window: outs for pitchers, PA for hitters.
    fn recent_mlb_sample(&self, year: i32, window: usize) -> u32 {
        let recent = |level: Level, season: i32| {
            level.is_mlb() && season <= year && ((year - season) as usize) < window
        };

        match self {
            SeasonLines::Pitching(lines) => lines.iter().filter(|s| recent(s.level, s.year)).map(|s| s.outs).sum(),
            SeasonLines::Batting(lines) => lines.iter().filter(|s| recent(s.level, s.year)).map(|s| s.pa).sum()
        }
    }
}

/// Everything known about one player going into the chain.
#[derive(Debug, Clone, Copy)]
pub struct PlayerEvidence<'a> {
    pub player: &'a Player,
    pub player_type: PlayerType,
    pub scouting: Option<&'a ScoutingGrade>,
    pub seasons: SeasonLines<'a>
}

/// wOBA implied by per-PA component rates: BB%, K%, HR% (per 100 PA), BABIP
/// and extra-base hits per at-bat.
pub fn woba_from_rates(rates: &BTreeMap<Component, f64>, league: &LeagueDefaults) -> f64 {
    let rate = |component: Component| rates.get(&component).copied().unwrap_or(0.0);

    let bb = (rate(Component::Eye) / 100.0).max(0.0);
    let k = (rate(Component::AvoidK) / 100.0).max(0.0);
    let hr = (rate(Component::Power) / 100.0).max(0.0);
    let at_bats = (1.0 - bb).max(0.0);
    let balls_in_play = (1.0 - bb - k - hr).max(0.0);

    let hits_in_play = rate(Component::Contact).max(0.0) * balls_in_play;
    let extra_base = (rate(Component::Gap).max(0.0) * at_bats).min(hits_in_play);
    let doubles = extra_base * league.doubles_share_of_xbh;
    let triples = extra_base - doubles;
    let singles = hits_in_play - extra_base;

    league.woba_bb * bb
        + league.woba_single * singles
        + league.woba_double * doubles
        + league.woba_triple * triples
        + league.woba_hr * hr
}

fn aggregate_stat(player_type: PlayerType, rates: &BTreeMap<Component, f64>, ctx: &ProjectionContext<'_>) -> f64 {
    if player_type.is_pitcher() {
        let rate = |component: Component| {
            rates
                .get(&component)
                .copied()
                .unwrap_or_else(|| ctx.config.component(component).formula.rate(50.0))
        };
        fip_from_rates(
            rate(Component::Stuff),
            rate(Component::Control),
            rate(Component::Hra),
            ctx.league.fip_constant
        )
    } else {
        woba_from_rates(rates, &ctx.config.league)
    }
}

fn aggregate_rating(player_type: PlayerType, stat: f64, ctx: &ProjectionContext<'_>) -> RatingResult {
    let metric = Metric::aggregate(player_type.is_pitcher());
    let percentile = match ctx.distributions.get(metric) {
        Some(distribution) => to_percentile(stat, distribution),
        None => 50.0
    };

    rating_result(percentile, &ctx.config.rating_table)
}

/// Wins above replacement at `stat`, over a full season of projected playing time.
pub fn projected_war(player_type: PlayerType, stat: f64, ctx: &ProjectionContext<'_>) -> f64 {
    let projection = &ctx.config.projection;

    let runs = match player_type {
        PlayerType::Hitter => {
            let replacement = ctx.league.woba - projection.replacement_woba_offset;
            (stat - replacement) / ctx.config.league.woba_scale * projection.projected_pa
        }
        PlayerType::Starter | PlayerType::Reliever => {
            let innings = if player_type == PlayerType::Starter {
                projection.projected_ip_starter
            } else {
                projection.projected_ip_reliever
            };
            let replacement = ctx.league.era + projection.replacement_fip_offset;
            (replacement - stat) / 9.0 * innings
        }
    };

    runs / projection.runs_per_win
}

fn age_in_season(evidence: &PlayerEvidence<'_>, year: i32) -> Option<f64> {
    season_reference_date(year, AGE_REFERENCE_MONTH, AGE_REFERENCE_DAY)
        .and_then(|date| evidence.player.age_on(date))
        .or_else(|| evidence.scouting.and_then(|s| s.age).map(|a| a as f64))
}

struct Ceiling {
    grade: f64,
    rate: f64,
    scouting_weight: f64,
    sample: f64
}

/// Rates one player. `None` when there is neither scouting nor usable stats.
pub fn project_player(evidence: &PlayerEvidence<'_>, ctx: &ProjectionContext<'_>) -> Option<PlayerProjection> {
    let config = ctx.config;
    let player = evidence.player;
    let components = Component::for_pitchers(evidence.player_type.is_pitcher());

    let mut league_defaults = config.league;
    league_defaults.fip_constant = ctx.league.fip_constant;

    let mut ceilings: BTreeMap<Component, Ceiling> = BTreeMap::new();
    let mut observed_raw: BTreeMap<Component, ObservedSample> = BTreeMap::new();
    let mut has_stats = false;

    for &component in components {
        let formula = &config.component(component).formula;
        let observations = evidence
            .seasons
            .observations(component, ctx.year, &league_defaults, false);

        let observed = ObservedSample::aggregate(component, &observations, config);
        if let Some(raw) = ObservedSample::aggregate_raw(component, &observations, config) {
            observed_raw.insert(component, raw);
        }
        has_stats |= observed.is_some();

        let scouting_rate = evidence
            .scouting
            .and_then(|s| s.potential(component))
            .map(|grade| grade_to_rate(grade, formula));

        let Some(blend) = blend_evidence(component, scouting_rate, observed, config) else {
            continue;
        };

        ceilings.insert(
            component,
            Ceiling {
                grade: rate_to_grade(blend.rate, formula),
                rate: blend.rate,
                scouting_weight: blend.scouting_weight,
                sample: blend.sample
            }
        );
    }

    if ceilings.is_empty() {
        warn!("Player {} has neither scouting nor stats, skipping", player.id);
        return None;
    }

    match (evidence.scouting.is_some(), has_stats) {
        (true, false) => warn!("Player {} has no stats, rating from scouting alone", player.id),
        (false, true) => warn!("Player {} has no scouting report, rating from stats alone", player.id),
        _ => {}
    }

    // Components with no evidence at all sit at an average grade
    for &component in components {
        ceilings.entry(component).or_insert_with(|| {
            let rate = grade_to_rate(50.0, &config.component(component).formula);
            Ceiling {
                grade: 50.0,
                rate,
                scouting_weight: 1.0,
                sample: 0.0
            }
        });
    }

    // Ceiling grades, read back as rates so clamping at 80 carries into the aggregate
    let peak_rates: BTreeMap<Component, f64> = ceilings
        .iter()
        .map(|(&c, ceiling)| (c, grade_to_rate(ceiling.grade, &config.component(c).formula)))
        .collect();
    let peak_stat = aggregate_stat(evidence.player_type, &peak_rates, ctx);
    let true_future_rating = aggregate_rating(evidence.player_type, peak_stat, ctx);

    let mlb_sample = evidence.seasons.recent_mlb_sample(ctx.year, config.recency_weights.len());
    let threshold = if evidence.player_type.is_pitcher() {
        config.projection.established_mlb_outs
    } else {
        config.projection.established_mlb_pa
    };
    let established = mlb_sample >= threshold;
    let age = age_in_season(evidence, ctx.year);

    let current_grades: BTreeMap<Component, f64> = if established {
        components
            .iter()
            .map(|&component| {
                let formula = &config.component(component).formula;
                let mlb = evidence
                    .seasons
                    .observations(component, ctx.year, &league_defaults, true);
                let observed = ObservedSample::aggregate(component, &mlb, config);
                let scouting_rate = evidence
                    .scouting
                    .and_then(|s| s.current(component))
                    .map(|grade| grade_to_rate(grade, formula));

                let ceiling = ceilings[&component].grade;
                let grade = blend_evidence(component, scouting_rate, observed, config)
                    .map(|blend| rate_to_grade(blend.rate, formula))
                    .unwrap_or(ceiling);

                (component, grade.min(ceiling))
            })
            .collect()
    } else {
        let development_age = age.unwrap_or(config.distribution.age_min as f64);
        let inputs: Vec<DevelopmentInput> = components
            .iter()
            .map(|&component| DevelopmentInput {
                component,
                ceiling: ceilings[&component].grade,
                peak_rate: ceilings[&component].rate,
                observed: observed_raw.get(&component).copied()
            })
            .collect();

        develop_player(&inputs, development_age, config).into_iter().collect()
    };

    let current_rates: BTreeMap<Component, f64> = current_grades
        .iter()
        .map(|(&c, &grade)| (c, grade_to_rate(grade, &config.component(c).formula)))
        .collect();
    let current_stat = aggregate_stat(evidence.player_type, &current_rates, ctx);
    let true_rating = aggregate_rating(evidence.player_type, current_stat, ctx).capped_at(&true_future_rating);

    let component_ratings = components
        .iter()
        .map(|&component| {
            let ceiling = &ceilings[&component];
            let percentile = ctx
                .distributions
                .get(component.metric())
                .map(|d| to_percentile(ceiling.rate, d))
                .unwrap_or(50.0);

            ComponentRating {
                component,
                ceiling: ceiling.grade,
                current: current_grades
                    .get(&component)
                    .copied()
                    .unwrap_or(ceiling.grade)
                    .min(ceiling.grade),
                blended_rate: ceiling.rate,
                percentile,
                scouting_weight: ceiling.scouting_weight,
                sample: ceiling.sample
            }
        })
        .collect();

    Some(PlayerProjection {
        player_id: player.id,
        name: player.name.clone(),
        team_id: player.organization(),
        level: player.level,
        age,
        player_type: evidence.player_type,
        true_rating,
        true_future_rating,
        components: component_ratings,
        current_stat,
        peak_stat,
        projected_war: projected_war(evidence.player_type, current_stat, ctx),
        established,
        sources: EvidenceSources {
            scouting: evidence.scouting.is_some(),
            stats: has_stats
        }
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            config::EngineConfig,
            development::current_ability_rating,
            distribution::{build_distributions, DistributionSet, PopulationInput},
            projection::{project_player, woba_from_rates, PlayerEvidence, ProjectionContext, SeasonLines},
            structures::{component::Component, level::Level, player_type::PlayerType, scouting_grade::ScoutingGrade}
        },
        stats::{league::LeagueConstants, stats_structs::PitchingStat},
        utils::test_utils::{generate_pitching_stat, generate_player}
    };
    use approx::assert_abs_diff_eq;
    use std::{
        collections::BTreeMap,
        io::Write,
        sync::{Arc, Mutex}
    };
    use strum::IntoEnumIterator;

    fn empty_distributions(config: &EngineConfig, league: &LeagueConstants) -> DistributionSet {
        let input = PopulationInput {
            pitching: &[],
            batting: &[],
            players: &[]
        };
        let metrics: Vec<_> = crate::model::structures::component::Metric::iter().collect();
        build_distributions(&metrics, &input, league, config)
    }

    fn pitcher_grades(stuff: f64) -> ScoutingGrade {
        let mut grade = ScoutingGrade::new(7, "Prospect Arm");
        grade.potential.insert(Component::Stuff, stuff);
        grade.potential.insert(Component::Control, 50.0);
        grade.potential.insert(Component::Hra, 50.0);
        grade
    }

    #[test]
    fn test_no_evidence_is_excluded() {
        let config = EngineConfig::default();
        let league = LeagueConstants::from_defaults(&config.league);
        let distributions = empty_distributions(&config, &league);
        let ctx = ProjectionContext {
            year: 2021,
            config: &config,
            league: &league,
            distributions: &distributions
        };

        let player = generate_player(7, 2000, true);
        let evidence = PlayerEvidence {
            player: &player,
            player_type: PlayerType::Starter,
            scouting: None,
            seasons: SeasonLines::Pitching(&[])
        };

        assert!(project_player(&evidence, &ctx).is_none());
    }

    #[test]
    fn test_scouting_only_prospect_follows_development_baseline() {
        let config = EngineConfig::default();
        let league = LeagueConstants::from_defaults(&config.league);
        let distributions = empty_distributions(&config, &league);
        let ctx = ProjectionContext {
            year: 2021,
            config: &config,
            league: &league,
            distributions: &distributions
        };

        let player = generate_player(7, 2000, true);
        let grades = pitcher_grades(60.0);
        let evidence = PlayerEvidence {
            player: &player,
            player_type: PlayerType::Starter,
            scouting: Some(&grades),
            seasons: SeasonLines::Pitching(&[])
        };

        let projection = project_player(&evidence, &ctx).unwrap();
        let stuff = projection.component(Component::Stuff).unwrap();

        assert_abs_diff_eq!(stuff.ceiling, 60.0, epsilon = 1e-9);
        assert_eq!(stuff.scouting_weight, 1.0);
        assert_eq!(stuff.sample, 0.0);

        let expected = current_ability_rating(
            Component::Stuff,
            60.0,
            stuff.blended_rate,
            projection.age.unwrap(),
            None,
            &config
        );
        assert_abs_diff_eq!(stuff.current, expected, epsilon = 1e-9);
        assert!(stuff.current < stuff.ceiling);
        assert!(!projection.established);
        assert!(projection.sources.scouting && !projection.sources.stats);
        assert!(projection.true_rating.rating <= projection.true_future_rating.rating);
    }

    #[test]
    fn test_established_pitcher_uses_mlb_record() {
        let config = EngineConfig::default();
        let league = LeagueConstants::from_defaults(&config.league);
        let distributions = empty_distributions(&config, &league);
        let ctx = ProjectionContext {
            year: 2021,
            config: &config,
            league: &league,
            distributions: &distributions
        };

        let player = generate_player(9, 1992, true);
        let seasons = vec![
            PitchingStat {
                outs: 540,
                k: 140,
                bb: 50,
                hra: 20,
                ..generate_pitching_stat(9, 2021, Level::Mlb)
            },
            PitchingStat {
                outs: 300,
                k: 100,
                bb: 20,
                hra: 10,
                ..generate_pitching_stat(9, 2020, Level::Aaa)
            }
        ];
        let evidence = PlayerEvidence {
            player: &player,
            player_type: PlayerType::Starter,
            scouting: None,
            seasons: SeasonLines::Pitching(&seasons)
        };

        let projection = project_player(&evidence, &ctx).unwrap();
        assert!(projection.established);
        assert!(projection.sources.stats && !projection.sources.scouting);

        // Current K/9 is the MLB 7.0 alone; the ceiling also counts the 9.0 in AAA
        let stuff = projection.component(Component::Stuff).unwrap();
        let formula = config.component(Component::Stuff).formula;
        assert_abs_diff_eq!(stuff.current, formula.grade(7.0), epsilon = 1e-9);
        assert!(stuff.current < stuff.ceiling);
        assert!(projection.projected_war > 0.0);
    }

    /// Ten prime-age starters with K/9 from 4.5 to 9.0 and identical walk and homer rates.
    fn starter_population(config: &EngineConfig, league: &LeagueConstants) -> DistributionSet {
        let players: Vec<_> = (100..110).map(|id| generate_player(id, 1990, true)).collect();
        let pitching: Vec<_> = (100..110u32)
            .map(|id| PitchingStat {
                outs: 540,
                k: 90 + (id - 100) * 10,
                bb: 50,
                hra: 18,
                ..generate_pitching_stat(id as i32, 2019, Level::Mlb)
            })
            .collect();
        let input = PopulationInput {
            pitching: &pitching,
            batting: &[],
            players: &players
        };
        let metrics: Vec<_> = crate::model::structures::component::Metric::iter().collect();
        build_distributions(&metrics, &input, league, config)
    }

    #[test]
    fn test_reference_population_separates_prospects() {
        let config = EngineConfig::default();
        let league = LeagueConstants::from_defaults(&config.league);
        let distributions = starter_population(&config, &league);
        let ctx = ProjectionContext {
            year: 2021,
            config: &config,
            league: &league,
            distributions: &distributions
        };

        let player = generate_player(7, 2000, true);
        let project = |stuff: f64| {
            let grades = pitcher_grades(stuff);
            let evidence = PlayerEvidence {
                player: &player,
                player_type: PlayerType::Starter,
                scouting: Some(&grades),
                seasons: SeasonLines::Pitching(&[])
            };
            project_player(&evidence, &ctx).unwrap()
        };

        let strong = project(70.0);
        let weak = project(40.0);

        // Peak FIP of the strong arm beats six of the ten starters, the weak arm's only one
        assert_abs_diff_eq!(strong.true_future_rating.percentile, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(weak.true_future_rating.percentile, 10.0, epsilon = 1e-9);
        assert!(strong.true_future_rating.rating > weak.true_future_rating.rating);

        let stuff = strong.component(Component::Stuff).unwrap();
        assert!(stuff.percentile > 50.0);

        for projection in [&strong, &weak] {
            assert!(projection.true_rating.percentile <= projection.true_future_rating.percentile);
            assert!(projection.true_rating.rating <= projection.true_future_rating.rating);
        }
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[test]
    fn test_single_source_and_excluded_players_warn() {
        let config = EngineConfig::default();
        let league = LeagueConstants::from_defaults(&config.league);
        let distributions = empty_distributions(&config, &league);
        let ctx = ProjectionContext {
            year: 2021,
            config: &config,
            league: &league,
            distributions: &distributions
        };

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let scouted = generate_player(7, 2000, true);
        let grades = pitcher_grades(60.0);
        let unscouted = generate_player(9, 1992, true);
        let seasons = [PitchingStat {
            outs: 540,
            ..generate_pitching_stat(9, 2021, Level::Mlb)
        }];
        let unknown = generate_player(11, 1995, true);

        tracing::subscriber::with_default(subscriber, || {
            let scouting_only = PlayerEvidence {
                player: &scouted,
                player_type: PlayerType::Starter,
                scouting: Some(&grades),
                seasons: SeasonLines::Pitching(&[])
            };
            let stats_only = PlayerEvidence {
                player: &unscouted,
                player_type: PlayerType::Starter,
                scouting: None,
                seasons: SeasonLines::Pitching(&seasons)
            };
            let neither = PlayerEvidence {
                player: &unknown,
                player_type: PlayerType::Starter,
                scouting: None,
                seasons: SeasonLines::Pitching(&[])
            };

            assert!(project_player(&scouting_only, &ctx).is_some());
            assert!(project_player(&stats_only, &ctx).is_some());
            assert!(project_player(&neither, &ctx).is_none());
        });

        let text = log.text();
        assert!(text.contains("Player 7 has no stats"), "{}", text);
        assert!(text.contains("Player 9 has no scouting report"), "{}", text);
        assert!(text.contains("Player 11 has neither scouting nor stats"), "{}", text);
    }

    #[test]
    fn test_woba_from_rates_matches_league_shape() {
        let config = EngineConfig::default();
        let rates = BTreeMap::from([
            (Component::Eye, 8.5),
            (Component::AvoidK, 21.0),
            (Component::Power, 3.0),
            (Component::Contact, 0.295),
            (Component::Gap, 0.05)
        ]);

        let woba = woba_from_rates(&rates, &config.league);
        assert!(woba > 0.28 && woba < 0.36, "league-average inputs gave {}", woba);

        let mut better = rates.clone();
        better.insert(Component::Power, 5.0);
        assert!(woba_from_rates(&better, &config.league) > woba);
    }
}
