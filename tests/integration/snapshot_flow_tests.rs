use crate::{common::init_test_env, integration::fixtures::fixture};
use std::{collections::BTreeSet, sync::Arc};
use true_rating_processor::{
    aggregation::LeaderCategory,
    model::structures::{
        component::{Component, Metric},
        player_type::PlayerType,
        stat_kind::StatKind
    }
};

#[tokio::test]
async fn test_team_snapshots_accrete() {
    init_test_env();
    let f = fixture().await;

    // Capital City brings both prospects from the affiliate plus its big-league bat
    let first = f.service.get_snapshot_for_teams(2021, &[1, 2]).await.unwrap();
    assert_eq!(f.service.computations(), 5);
    assert_eq!(first.len(), 5);
    assert_eq!(first.team(1).count(), 3);
    assert_eq!(first.team(2).count(), 2);

    let again = f.service.get_snapshot_for_teams(2021, &[2, 1]).await.unwrap();
    assert_eq!(f.service.computations(), 5);
    assert!(Arc::ptr_eq(&first, &again));

    // Bay City is already in; only Harbor City is rated
    let next = f.service.get_snapshot_for_teams(2021, &[2, 3]).await.unwrap();
    assert_eq!(f.service.computations(), 7);
    assert_eq!(next.len(), 7);
    assert_eq!(next.team(3).count(), 2);
    assert!([1, 2, 3].iter().all(|id| next.processed_teams().contains(id)));

    // Every organization is already in, so the full snapshot costs nothing
    let full = f.service.get_snapshot(2021).await.unwrap();
    assert_eq!(f.service.computations(), 7);
    assert!(full.is_complete());

    assert_eq!(f.feed.players_calls(), 1);
    assert_eq!(f.feed.teams_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_cold_requests_share_league_load() {
    init_test_env();
    let f = fixture().await;
    let service = Arc::new(f.service);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.league_data(2021).await })
        })
        .collect();

    let mut loaded = Vec::new();
    for handle in handles {
        loaded.push(handle.await.unwrap().unwrap());
    }

    assert!(loaded.iter().all(|data| Arc::ptr_eq(data, &loaded[0])));
    assert_eq!(f.feed.players_calls(), 1);
    assert_eq!(f.feed.teams_calls(), 1);
}

#[tokio::test]
async fn test_reference_seasons_spread_star_ratings() {
    init_test_env();
    let f = fixture().await;

    let data = f.service.league_data(2021).await.unwrap();
    assert!(data.distributions.iter().all(|d| !d.is_empty()));
    assert_eq!(data.distributions.get(Metric::Fip).unwrap().len(), 9);

    let ace = f.service.get_player_rating(2021, 3).await.unwrap().unwrap();
    let fading = f.service.get_player_rating(2021, 6).await.unwrap().unwrap();

    assert!(ace.established && fading.established);
    assert!(ace.true_future_rating.percentile > 50.0, "{:?}", ace.true_future_rating);
    assert!(fading.true_future_rating.percentile < 50.0, "{:?}", fading.true_future_rating);
    assert!(ace.true_future_rating.rating > fading.true_future_rating.rating);
    assert!(ace.true_rating.rating > fading.true_rating.rating);

    let bat = f.service.get_player_rating(2021, 4).await.unwrap().unwrap();
    let faded_bat = f.service.get_player_rating(2021, 7).await.unwrap().unwrap();
    assert!(bat.true_future_rating.rating > faded_bat.true_future_rating.rating);

    let snapshot = f.service.get_snapshot(2021).await.unwrap();
    let stars: BTreeSet<String> = snapshot
        .projections()
        .map(|p| format!("{:.1}", p.true_future_rating.rating))
        .collect();
    assert!(stars.len() >= 3, "expected a spread of ratings, got {:?}", stars);
}

#[tokio::test]
async fn test_concurrent_requests_share_league_load() {
    init_test_env();
    let f = fixture().await;

    let (capital, bay) = tokio::join!(
        f.service.get_snapshot_for_teams(2021, &[1]),
        f.service.get_snapshot_for_teams(2021, &[2])
    );
    capital.unwrap();
    bay.unwrap();

    assert_eq!(f.feed.players_calls(), 1);
    assert_eq!(f.feed.stats_calls(2021, StatKind::Pitching), 1);
    assert_eq!(f.feed.stats_calls(2021, StatKind::Batting), 1);
    assert_eq!(f.feed.stats_calls(2020, StatKind::Pitching), 1);
    assert_eq!(f.service.computations(), 5);
}

#[tokio::test]
async fn test_minor_league_innings_lift_current_stuff() {
    init_test_env();
    let f = fixture().await;

    let idle = f.service.get_player_rating(2021, 1).await.unwrap().unwrap();
    let busy = f.service.get_player_rating(2021, 2).await.unwrap().unwrap();

    let idle_stuff = idle.component(Component::Stuff).unwrap();
    assert_eq!(idle_stuff.scouting_weight, 1.0);
    assert_eq!(idle_stuff.sample, 0.0);
    assert!(idle_stuff.current < idle_stuff.ceiling);
    assert!(!idle.sources.stats);

    let busy_stuff = busy.component(Component::Stuff).unwrap();
    assert!(busy.sources.stats && busy.sources.scouting);
    assert!(busy_stuff.sample > 0.0);
    assert!(
        busy_stuff.current > idle_stuff.current,
        "{} should beat {}",
        busy_stuff.current,
        idle_stuff.current
    );
    assert!(busy_stuff.current <= busy_stuff.ceiling);

    // Both were folded into their parent club
    assert_eq!(idle.team_id, Some(1));
    assert_eq!(busy.player_type, PlayerType::Starter);
    assert!(busy.true_rating.rating <= busy.true_future_rating.rating);
}

#[tokio::test]
async fn test_rankings_and_leaders() {
    init_test_env();
    let f = fixture().await;

    let farm = f.service.farm_rankings(2021).await.unwrap();
    assert_eq!(farm.len(), 3);
    // Only Capital City has prospects
    assert_eq!(farm[0].abbr, "CAP");
    assert_eq!(farm[0].prospects.len(), 2);
    assert!(farm[1..].iter().all(|r| r.prospects.is_empty()));

    let power = f.service.power_rankings(2021).await.unwrap();
    let bay = power.iter().find(|r| r.abbr == "BAY").unwrap();
    assert!(bay.rotation > 0.0);
    assert!(bay.lineup > 0.0);

    let homers = f.service.league_leaders(2021, LeaderCategory::HomeRuns, 5).await.unwrap();
    assert_eq!(homers[0].line(), "1. Bay Bat (BAY): 25");
    assert_eq!(homers[1].line(), "2. Cap Bat (CAP): 15");

    // AA innings never reach a major-league board
    let strikeouts = f.service.league_leaders(2021, LeaderCategory::Strikeouts, 5).await.unwrap();
    assert_eq!(strikeouts.len(), 1);
    assert_eq!(strikeouts[0].player_id, 3);
}
