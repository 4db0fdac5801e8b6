use crate::{
    aggregation::snapshot::ProjectionSnapshot,
    model::{
        config::RankingConfig,
        structures::{level::Level, player_projection::PlayerProjection, player_type::PlayerType}
    },
    stats::stats_structs::Team
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProspectEntry {
    pub player_id: i32,
    pub name: String,
    pub age: Option<f64>,
    pub level: Option<Level>,
    pub true_future_rating: f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmRanking {
    pub rank: usize,
    pub team_id: i32,
    pub team_name: String,
    pub abbr: String,
    pub score: f64,
    pub prospects: Vec<ProspectEntry>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerRanking {
    pub rank: usize,
    pub team_id: i32,
    pub team_name: String,
    pub abbr: String,
    /// Average True Rating of each unit
    pub rotation: f64,
    pub bullpen: f64,
    pub lineup: f64,
    pub score: f64
}

/// Organizations to rank: the listed parent clubs, or every team id seen in
/// the snapshot when no team list is available.
fn organizations(snapshot: &ProjectionSnapshot, teams: &[Team]) -> Vec<(i32, String, String)> {
    let listed = teams
        .iter()
        .filter(|t| t.parent_team_id.is_none())
        .map(|t| (t.id, t.name.clone(), t.abbr.clone()))
        .collect_vec();
    if !listed.is_empty() {
        return listed;
    }

    snapshot
        .projections()
        .filter_map(|p| p.team_id)
        .unique()
        .sorted()
        .map(|id| (id, format!("Team {}", id), id.to_string()))
        .collect()
}

fn by_future_rating(a: &&PlayerProjection, b: &&PlayerProjection) -> Ordering {
    b.true_future_rating
        .rating
        .total_cmp(&a.true_future_rating.rating)
        .then(b.true_future_rating.percentile.total_cmp(&a.true_future_rating.percentile))
        .then(a.player_id.cmp(&b.player_id))
}

fn by_true_rating(a: &&PlayerProjection, b: &&PlayerProjection) -> Ordering {
    b.true_rating
        .rating
        .total_cmp(&a.true_rating.rating)
        .then(b.true_rating.percentile.total_cmp(&a.true_rating.percentile))
        .then(a.player_id.cmp(&b.player_id))
}

fn is_ranked_prospect(projection: &PlayerProjection, config: &RankingConfig) -> bool {
    projection.is_prospect() && projection.age.map_or(true, |age| age < config.prospect_max_age)
}

fn tier_value(rating: f64, config: &RankingConfig) -> f64 {
    config
        .farm_tiers
        .iter()
        .find(|t| rating >= t.min_rating)
        .map(|t| t.value)
        .unwrap_or(0.0)
}

fn assign_ranks<T>(mut rows: Vec<T>, score: impl Fn(&T) -> (f64, i32), set_rank: impl Fn(&mut T, usize)) -> Vec<T> {
    rows.sort_by(|a, b| {
        let (score_a, id_a) = score(a);
        let (score_b, id_b) = score(b);
        score_b.total_cmp(&score_a).then(id_a.cmp(&id_b))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        set_rank(row, idx + 1);
    }

    rows
}

/// Organizations ordered by the tiered value of their best prospects.
pub fn farm_rankings(snapshot: &ProjectionSnapshot, teams: &[Team], config: &RankingConfig) -> Vec<FarmRanking> {
    let rows = organizations(snapshot, teams)
        .into_iter()
        .map(|(team_id, team_name, abbr)| {
            let prospects = snapshot
                .team(team_id)
                .filter(|p| is_ranked_prospect(p, config))
                .sorted_by(by_future_rating)
                .take(config.farm_top_prospects)
                .collect_vec();

            FarmRanking {
                rank: 0,
                team_id,
                team_name,
                abbr,
                score: prospects
                    .iter()
                    .map(|p| tier_value(p.true_future_rating.rating, config))
                    .sum(),
                prospects: prospects
                    .iter()
                    .map(|p| ProspectEntry {
                        player_id: p.player_id,
                        name: p.name.clone(),
                        age: p.age,
                        level: p.level,
                        true_future_rating: p.true_future_rating.rating
                    })
                    .collect()
            }
        })
        .collect_vec();

    assign_ranks(rows, |r| (r.score, r.team_id), |r, rank| r.rank = rank)
}

fn unit_average<'a>(players: impl Iterator<Item = &'a PlayerProjection>, size: usize) -> f64 {
    let ratings = players
        .sorted_by(by_true_rating)
        .take(size)
        .map(|p| p.true_rating.rating)
        .collect_vec();

    if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    }
}

/// Organizations ordered by the weighted True Rating of their major-league
/// rotation, bullpen and lineup.
pub fn power_rankings(snapshot: &ProjectionSnapshot, teams: &[Team], config: &RankingConfig) -> Vec<PowerRanking> {
    let rows = organizations(snapshot, teams)
        .into_iter()
        .map(|(team_id, team_name, abbr)| {
            let roster = snapshot.team(team_id).filter(|p| !p.is_prospect()).collect_vec();
            let of_type = |t: PlayerType| roster.iter().copied().filter(move |p| p.player_type == t);

            let rotation = unit_average(of_type(PlayerType::Starter), config.rotation_size);
            let bullpen = unit_average(of_type(PlayerType::Reliever), config.bullpen_size);
            let lineup = unit_average(of_type(PlayerType::Hitter), config.lineup_size);

            PowerRanking {
                rank: 0,
                team_id,
                team_name,
                abbr,
                rotation,
                bullpen,
                lineup,
                score: rotation * config.rotation_weight
                    + bullpen * config.bullpen_weight
                    + lineup * config.lineup_weight
            }
        })
        .collect_vec();

    assign_ranks(rows, |r| (r.score, r.team_id), |r, rank| r.rank = rank)
}
