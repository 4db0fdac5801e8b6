use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use true_rating_processor::{
    aggregation::SnapshotService,
    model::{config::EngineConfig, structures::stat_kind::StatKind},
    scouting::{ScoutingKind, ScoutingRepository},
    stats::{clock::FixedClock, RepositoryConfig, StatsRepository},
    store::MemoryStore,
    utils::test_utils::FakeFeed
};

pub const SCOUTING_SOURCE: &str = "default";

/// Capital City (1) with its AA affiliate (11), Bay City (2) and Harbor City (3).
pub const TEAMS: &str = "team_id,name,abbr,parent_team_id,level\n\
    1,Capital City,CAP,0,mlb\n\
    11,Capital Farm,CPF,1,aa\n\
    2,Bay City,BAY,0,mlb\n\
    3,Harbor City,HAR,0,mlb\n";

/// Players 1 and 2 are identical 21-year-old prospects; only player 2 has pitched.
/// Harbor's veterans 6 and 7 only appear in earlier seasons.
pub const PLAYERS: &str = "player_id,name,team_id,level,position,date_of_birth\n\
    1,Zero Sample,11,aa,1,2000-04-01\n\
    2,Busy Arm,11,aa,1,2000-04-01\n\
    3,Bay Ace,2,mlb,1,1992-05-01\n\
    4,Bay Bat,2,mlb,8,1993-06-01\n\
    5,Cap Bat,1,mlb,3,1994-01-01\n\
    6,Harbor Arm,3,mlb,1,1988-03-01\n\
    7,Harbor Bat,3,mlb,7,1989-02-01\n";

const PITCHING_HEADER: &str = "player_id,year,team_id,level_id,split_id,ip,k,bb,hra,er,h,gs,g,war\n";
const BATTING_HEADER: &str = "player_id,year,team_id,level_id,split_id,pa,ab,h,d,t,hr,bb,k,sb,cs,war\n";

/// 250 AA innings at roughly 10 K/9 for player 2.
pub const PITCHING_2020_AA: &str = "2,2020,11,3,1,120.0,133,40,10,50,110,22,22,0.0\n";

pub const PITCHING_2021: &str = "player_id,year,team_id,level_id,split_id,ip,k,bb,hra,er,h,gs,g,war\n\
    2,2021,11,3,1,130.0,144,42,11,55,118,24,24,0.0\n\
    3,2021,2,1,1,180.0,180,50,20,70,160,30,30,3.5\n";

pub const BATTING_2021: &str = "player_id,year,team_id,level_id,split_id,pa,ab,h,d,t,hr,bb,k,sb,cs,war\n\
    4,2021,2,1,1,600,540,150,30,3,25,55,120,8,3,3.1\n\
    5,2021,1,1,1,550,500,130,25,2,15,45,110,12,4,1.8\n";

/// Prime-age major-league seasons behind the reference distributions. Bay's
/// pair are well above the league; Harbor's veterans fade badly from 2019.
fn pitching_history(year: i32) -> String {
    let mut text = PITCHING_HEADER.to_string();
    if year >= 2017 {
        text += &format!("3,{},2,1,1,180.0,190,45,15,60,150,30,30,4.0\n", year);
    }
    if year <= 2018 {
        text += &format!("6,{},3,1,1,170.0,150,50,17,75,165,28,28,2.0\n", year);
    } else {
        text += &format!("6,{},3,1,1,150.0,90,60,25,85,170,26,26,0.2\n", year);
    }
    if year == 2020 {
        text += PITCHING_2020_AA;
    }
    text
}

fn batting_history(year: i32) -> String {
    let mut text = BATTING_HEADER.to_string();
    if year >= 2018 {
        text += &format!("4,{},2,1,1,620,550,160,32,3,28,60,115,9,3,4.0\n", year);
    }
    if year <= 2018 {
        text += &format!("7,{},3,1,1,560,505,135,26,2,14,48,110,6,2,2.2\n", year);
    } else {
        text += &format!("7,{},3,1,1,500,465,100,15,1,5,30,140,3,2,-0.2\n", year);
    }
    text
}

pub const PITCHER_SCOUTING: &str = "1,Zero Sample,60,50,50\n2,Busy Arm,60,50,50\n";

pub struct Fixture {
    pub feed: Arc<FakeFeed>,
    pub service: SnapshotService
}

pub async fn fixture() -> Fixture {
    let mut feed = FakeFeed::new()
        .with_teams(TEAMS)
        .with_players(PLAYERS)
        .with_stats(2021, StatKind::Pitching, PITCHING_2021)
        .with_stats(2021, StatKind::Batting, BATTING_2021);
    for year in 2016..=2020 {
        feed = feed
            .with_stats(year, StatKind::Pitching, &pitching_history(year))
            .with_stats(year, StatKind::Batting, &batting_history(year));
    }
    let feed = Arc::new(feed);
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2021, 9, 1, 0, 0, 0).unwrap()));
    let repository = Arc::new(StatsRepository::with_clock(
        feed.clone(),
        Arc::new(MemoryStore::new()),
        clock,
        RepositoryConfig::default()
    ));

    let scouting = Arc::new(ScoutingRepository::new(Arc::new(MemoryStore::new())));
    scouting
        .save(
            SCOUTING_SOURCE,
            NaiveDate::from_ymd_opt(2021, 8, 1).unwrap(),
            ScoutingKind::Pitchers,
            PITCHER_SCOUTING
        )
        .await
        .unwrap();

    let service = SnapshotService::new(repository, scouting, SCOUTING_SOURCE, Arc::new(EngineConfig::default())).unwrap();

    Fixture { feed, service }
}
