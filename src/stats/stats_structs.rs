use crate::{
    model::{
        config::LeagueDefaults,
        constants::COMBINED_SPLIT_ID,
        structures::{component::Metric, level::Level, stat_kind::StatKind}
    },
    utils::delimited::{ParseError, Row}
};
use chrono::{Datelike, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// A single season line for one player at one level, possibly one team stint.
pub trait SeasonRow: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: StatKind;

    /// `Ok(None)` for rows that are not the combined split or name an unknown level.
    fn from_row(row: &Row<'_>) -> Result<Option<Self>, ParseError>;

    fn player_id(&self) -> i32;
    fn year(&self) -> i32;
    fn team_id(&self) -> i32;
    fn level(&self) -> Level;
    fn name(&self) -> Option<&str>;
    fn set_name(&mut self, name: String);

    /// Folds another stint of the same player-season into this one.
    fn merge(&mut self, other: &Self);
}

/// Rows outside the combined split (platoon splits and the like) are dropped.
fn is_combined_split(row: &Row<'_>) -> Result<bool, ParseError> {
    Ok(row
        .get_i32("split_id")?
        .map(|id| id == COMBINED_SPLIT_ID)
        .unwrap_or(true))
}

fn required_i32(row: &Row<'_>, column: &str) -> Result<i32, ParseError> {
    row.get_i32(column)?.ok_or_else(|| ParseError::NotNumeric {
        line: row.line(),
        column: column.to_string(),
        value: String::new()
    })
}

fn parse_level(row: &Row<'_>) -> Result<Option<Level>, ParseError> {
    let level_id = required_i32(row, "level_id")?;
    let level = Level::try_from(level_id).ok();
    if level.is_none() {
        debug!("Skipping line {} with unknown level {}", row.line(), level_id);
    }

    Ok(level)
}

/// Parses an innings string such as `"50.1"` into outs (151). The digit after
/// the point counts outs, so it must be 0, 1 or 2.
pub fn parse_innings(value: &str) -> Option<u32> {
    let value = value.trim();
    let (whole, partial) = match value.split_once('.') {
        Some((whole, partial)) => (whole, partial),
        None => (value, "0")
    };

    let whole: u32 = whole.parse().ok()?;
    let partial: u32 = match partial {
        "" | "0" => 0,
        "1" => 1,
        "2" => 2,
        _ => return None
    };

    whole.checked_mul(3)?.checked_add(partial)
}

/// Outs back to the `whole.partial` innings notation.
pub fn format_innings(outs: u32) -> String {
    format!("{}.{}", outs / 3, outs % 3)
}

fn per_nine(count: u32, outs: u32) -> Option<f64> {
    if outs == 0 {
        return None;
    }

    Some(count as f64 * 27.0 / outs as f64)
}

fn ratio(numerator: f64, denominator: u32) -> Option<f64> {
    if denominator == 0 {
        return None;
    }

    Some(numerator / denominator as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchingStat {
    pub player_id: i32,
    #[serde(default)]
    pub name: Option<String>,
    pub year: i32,
    pub team_id: i32,
    pub level: Level,
    /// Innings are kept as outs so stints add exactly
    pub outs: u32,
    pub k: u32,
    pub bb: u32,
    pub hra: u32,
    pub er: u32,
    pub h: u32,
    pub gs: u32,
    pub g: u32,
    pub war: f64
}

impl PitchingStat {
    pub fn innings(&self) -> f64 {
        self.outs as f64 / 3.0
    }

    pub fn ip_display(&self) -> String {
        format_innings(self.outs)
    }

    pub fn k9(&self) -> Option<f64> {
        per_nine(self.k, self.outs)
    }

    pub fn bb9(&self) -> Option<f64> {
        per_nine(self.bb, self.outs)
    }

    pub fn hr9(&self) -> Option<f64> {
        per_nine(self.hra, self.outs)
    }

    pub fn era(&self) -> Option<f64> {
        per_nine(self.er, self.outs)
    }

    pub fn fip(&self, fip_constant: f64) -> Option<f64> {
        Some(fip_from_rates(self.k9()?, self.bb9()?, self.hr9()?, fip_constant))
    }

    /// Share of appearances that were starts.
    pub fn gs_share(&self) -> Option<f64> {
        ratio(self.gs as f64, self.g)
    }

    /// Pitching metrics only; hitting metrics are `None`.
    pub fn rate(&self, metric: Metric, fip_constant: f64) -> Option<f64> {
        match metric {
            Metric::K9 => self.k9(),
            Metric::Bb9 => self.bb9(),
            Metric::Hr9 => self.hr9(),
            Metric::Fip => self.fip(fip_constant),
            _ => None
        }
    }
}

/// FIP from per-nine rates: `(13*HR9 + 3*BB9 - 2*K9) / 9 + constant`.
pub fn fip_from_rates(k9: f64, bb9: f64, hr9: f64, fip_constant: f64) -> f64 {
    (13.0 * hr9 + 3.0 * bb9 - 2.0 * k9) / 9.0 + fip_constant
}

impl SeasonRow for PitchingStat {
    const KIND: StatKind = StatKind::Pitching;

    fn from_row(row: &Row<'_>) -> Result<Option<Self>, ParseError> {
        if !is_combined_split(row)? {
            return Ok(None);
        }
        let Some(level) = parse_level(row)? else {
            return Ok(None);
        };

        let ip = row.get_str("ip").unwrap_or("0");
        let outs = parse_innings(ip).ok_or_else(|| ParseError::NotNumeric {
            line: row.line(),
            column: "ip".to_string(),
            value: ip.to_string()
        })?;

        Ok(Some(PitchingStat {
            player_id: required_i32(row, "player_id")?,
            name: None,
            year: required_i32(row, "year")?,
            team_id: row.get_i32("team_id")?.unwrap_or(0),
            level,
            outs,
            k: row.count("k")?,
            bb: row.count("bb")?,
            hra: row.count("hra")?,
            er: row.count("er")?,
            h: row.count("h")?,
            gs: row.count("gs")?,
            g: row.count("g")?,
            war: row.get_f64("war")?.unwrap_or(0.0)
        }))
    }

    fn player_id(&self) -> i32 {
        self.player_id
    }

    fn year(&self) -> i32 {
        self.year
    }

    fn team_id(&self) -> i32 {
        self.team_id
    }

    fn level(&self) -> Level {
        self.level
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn merge(&mut self, other: &Self) {
        self.outs += other.outs;
        self.k += other.k;
        self.bb += other.bb;
        self.hra += other.hra;
        self.er += other.er;
        self.h += other.h;
        self.gs += other.gs;
        self.g += other.g;
        self.war += other.war;
        // The later stint is the player's current club
        self.team_id = other.team_id;
        if self.name.is_none() {
            self.name = other.name.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattingStat {
    pub player_id: i32,
    #[serde(default)]
    pub name: Option<String>,
    pub year: i32,
    pub team_id: i32,
    pub level: Level,
    pub pa: u32,
    pub ab: u32,
    pub h: u32,
    pub d: u32,
    pub t: u32,
    pub hr: u32,
    pub bb: u32,
    pub k: u32,
    pub sb: u32,
    pub cs: u32,
    pub war: f64
}

impl BattingStat {
    pub fn singles(&self) -> u32 {
        self.h.saturating_sub(self.d + self.t + self.hr)
    }

    pub fn avg(&self) -> Option<f64> {
        ratio(self.h as f64, self.ab)
    }

    pub fn bb_pct(&self) -> Option<f64> {
        ratio(self.bb as f64 * 100.0, self.pa)
    }

    pub fn k_pct(&self) -> Option<f64> {
        ratio(self.k as f64 * 100.0, self.pa)
    }

    pub fn hr_pct(&self) -> Option<f64> {
        ratio(self.hr as f64 * 100.0, self.pa)
    }

    /// Hits on balls in play over balls in play (`AB - K - HR`).
    pub fn babip(&self) -> Option<f64> {
        let balls_in_play = self.ab.saturating_sub(self.k + self.hr);
        ratio(self.h.saturating_sub(self.hr) as f64, balls_in_play)
    }

    pub fn xbh_rate(&self) -> Option<f64> {
        ratio((self.d + self.t) as f64, self.ab)
    }

    pub fn sb_rate(&self) -> Option<f64> {
        ratio(self.sb as f64, self.pa)
    }

    pub fn woba(&self, league: &LeagueDefaults) -> Option<f64> {
        let numerator = league.woba_bb * self.bb as f64
            + league.woba_single * self.singles() as f64
            + league.woba_double * self.d as f64
            + league.woba_triple * self.t as f64
            + league.woba_hr * self.hr as f64;

        ratio(numerator, self.pa)
    }

    /// Hitting metrics only; pitching metrics are `None`.
    pub fn rate(&self, metric: Metric, league: &LeagueDefaults) -> Option<f64> {
        match metric {
            Metric::BbPct => self.bb_pct(),
            Metric::KPct => self.k_pct(),
            Metric::HrPct => self.hr_pct(),
            Metric::Babip => self.babip(),
            Metric::XbhRate => self.xbh_rate(),
            Metric::SbRate => self.sb_rate(),
            Metric::Woba => self.woba(league),
            _ => None
        }
    }
}

impl SeasonRow for BattingStat {
    const KIND: StatKind = StatKind::Batting;

    fn from_row(row: &Row<'_>) -> Result<Option<Self>, ParseError> {
        if !is_combined_split(row)? {
            return Ok(None);
        }
        let Some(level) = parse_level(row)? else {
            return Ok(None);
        };

        Ok(Some(BattingStat {
            player_id: required_i32(row, "player_id")?,
            name: None,
            year: required_i32(row, "year")?,
            team_id: row.get_i32("team_id")?.unwrap_or(0),
            level,
            pa: row.count("pa")?,
            ab: row.count("ab")?,
            h: row.count("h")?,
            d: row.count("d")?,
            t: row.count("t")?,
            hr: row.count("hr")?,
            bb: row.count("bb")?,
            k: row.count("k")?,
            sb: row.count("sb")?,
            cs: row.count("cs")?,
            war: row.get_f64("war")?.unwrap_or(0.0)
        }))
    }

    fn player_id(&self) -> i32 {
        self.player_id
    }

    fn year(&self) -> i32 {
        self.year
    }

    fn team_id(&self) -> i32 {
        self.team_id
    }

    fn level(&self) -> Level {
        self.level
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    fn merge(&mut self, other: &Self) {
        self.pa += other.pa;
        self.ab += other.ab;
        self.h += other.h;
        self.d += other.d;
        self.t += other.t;
        self.hr += other.hr;
        self.bb += other.bb;
        self.k += other.k;
        self.sb += other.sb;
        self.cs += other.cs;
        self.war += other.war;
        self.team_id = other.team_id;
        if self.name.is_none() {
            self.name = other.name.clone();
        }
    }
}

/// Roster role, where the feed has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RosterRole {
    Starter,
    Reliever,
    Closer
}

impl RosterRole {
    /// `SP`/`RP`/`CL` or the numeric codes 11/12/13.
    pub fn parse(value: &str) -> Option<RosterRole> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SP" | "11" => Some(RosterRole::Starter),
            "RP" | "12" => Some(RosterRole::Reliever),
            "CL" | "13" => Some(RosterRole::Closer),
            _ => None
        }
    }

    pub fn is_starter(&self) -> bool {
        *self == RosterRole::Starter
    }
}

const PITCHER_POSITION: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i32,
    pub name: String,
    pub team_id: Option<i32>,
    pub organization_id: Option<i32>,
    pub level: Option<Level>,
    pub position: Option<i32>,
    pub role: Option<RosterRole>,
    pub date_of_birth: Option<NaiveDate>,
    pub age: Option<u8>
}

impl Player {
    pub fn from_row(row: &Row<'_>) -> Result<Player, ParseError> {
        let id = required_i32(row, "player_id").or_else(|_| required_i32(row, "id"))?;

        let name = match (row.get_str("first_name"), row.get_str("last_name")) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            _ => row
                .get_str("name")
                .map(|n| n.to_string())
                .unwrap_or_else(|| format!("Player {}", id))
        };

        let level = match row.get_str("level") {
            Some(label) => Level::from_label(label),
            None => row.get_i32("level_id")?.and_then(|l| Level::try_from(l).ok())
        };

        let date_of_birth = row
            .get_str("date_of_birth")
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        Ok(Player {
            id,
            name,
            team_id: row.get_i32("team_id")?.filter(|t| *t > 0),
            organization_id: row.get_i32("organization_id")?.filter(|t| *t > 0),
            level,
            position: row.get_i32("position")?,
            role: row.get_str("role").and_then(RosterRole::parse),
            date_of_birth,
            age: row.get_u32("age")?.and_then(|a| u8::try_from(a).ok())
        })
    }

    pub fn is_pitcher(&self) -> bool {
        self.position == Some(PITCHER_POSITION)
    }

    /// Age in fractional years on `date`, falling back to the listed age.
    pub fn age_on(&self, date: NaiveDate) -> Option<f64> {
        match self.date_of_birth {
            Some(dob) => Some((date - dob).num_days() as f64 / 365.25),
            None => self.age.map(|a| a as f64)
        }
    }

    /// Whole years on `date`.
    pub fn whole_age_on(&self, date: NaiveDate) -> Option<u32> {
        match self.date_of_birth {
            Some(dob) => date.years_since(dob),
            None => self.age.map(|a| a as u32)
        }
    }

    /// The organization a player belongs to, preferring the parent club.
    pub fn organization(&self) -> Option<i32> {
        self.organization_id.or(self.team_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i32,
    pub name: String,
    pub abbr: String,
    pub parent_team_id: Option<i32>,
    pub level: Option<Level>
}

impl Team {
    pub fn from_row(row: &Row<'_>) -> Result<Team, ParseError> {
        let id = required_i32(row, "team_id").or_else(|_| required_i32(row, "id"))?;
        let name = row.get_str("name").unwrap_or_default().to_string();
        let abbr = row
            .get_str("abbr")
            .map(|a| a.to_string())
            .unwrap_or_else(|| name.chars().take(3).collect::<String>().to_uppercase());

        let level = match row.get_str("level") {
            Some(label) => Level::from_label(label),
            None => row.get_i32("level_id")?.and_then(|l| Level::try_from(l).ok())
        };

        Ok(Team {
            id,
            name,
            abbr,
            parent_team_id: row.get_i32("parent_team_id")?.filter(|p| *p > 0),
            level
        })
    }

    /// The major-league club this team reports to (itself when it is one).
    pub fn organization_id(&self) -> i32 {
        self.parent_team_id.unwrap_or(self.id)
    }
}

/// Reference date for ages within a season.
pub fn season_reference_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Completed seasons strictly before `year`.
pub fn is_completed_season(year: i32, today: NaiveDate) -> bool {
    year < today.year()
}
