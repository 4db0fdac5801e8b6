//! Scouting uploads.
//!
//! Two layouts are accepted. Without a header the columns are positional:
//! `player_id, name, <component grades...>[, age]`. With a header, columns are
//! found by name (common abbreviations included) and the optional extras are
//! picked up: star grades, current grades, stamina, pitch count, durability
//! and personality.
//!
//! A file is accepted whole or not at all.

use crate::{
    model::structures::{
        component::{Component, HITTING_COMPONENTS, PITCHING_COMPONENTS},
        scouting_grade::{clamp_grade, parse_stars, ScoutingGrade, Tier}
    },
    utils::delimited::{detect_delimiter, parse_records, ParseError, Record}
};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ScoutingError {
    #[error("line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("scouting upload has no rows")]
    Empty,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError)
}

fn invalid(line: u64, reason: impl Into<String>) -> ScoutingError {
    ScoutingError::InvalidRow {
        line,
        reason: reason.into()
    }
}

fn aliases(component: Component) -> &'static [&'static str] {
    match component {
        Component::Stuff => &["stuff", "stf", "stu"],
        Component::Control => &["control", "ctl", "con"],
        Component::Hra => &["hra", "hr", "hrr", "movement", "mov"],
        Component::Eye => &["eye", "eye_pot", "bb"],
        Component::AvoidK => &["avoid_k", "avoidk", "avk", "k's", "ks"],
        Component::Power => &["power", "pow", "pwr"],
        Component::Contact => &["contact", "cont", "babip", "ctc"],
        Component::Gap => &["gap", "gap_power", "gp"],
        Component::Speed => &["speed", "spd", "spe"]
    }
}

const ID_COLUMNS: &[&str] = &["player_id", "id", "pid"];
const NAME_COLUMNS: &[&str] = &["name", "player", "player_name"];

fn normalize(header: &str) -> String {
    header.trim().to_ascii_lowercase().replace([' ', '-', '.'], "_")
}

/// Where each known column sits in a header row.
struct Layout {
    columns: HashMap<String, usize>
}

impl Layout {
    fn from_header(header: &Record) -> Layout {
        Layout {
            columns: header
                .fields
                .iter()
                .enumerate()
                .map(|(idx, name)| (normalize(name), idx))
                .collect()
        }
    }

    fn find(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.columns.get(*n).copied())
    }

    fn find_suffixed(&self, names: &[&str], suffixes: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| {
            suffixes
                .iter()
                .find_map(|s| self.columns.get(&format!("{}{}", n, s)).copied())
        })
    }
}

fn looks_like_header(record: &Record) -> bool {
    record
        .field(0)
        .map(|f| f.parse::<i64>().is_err())
        .unwrap_or(true)
}

fn number(record: &Record, idx: usize, what: &str) -> Result<Option<f64>, ScoutingError> {
    match record.field(idx) {
        None => Ok(None),
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(invalid(record.line, format!("{} '{}' is not a number", what, raw)))
        }
    }
}

fn player_id(record: &Record, idx: usize) -> Result<i32, ScoutingError> {
    let raw = record
        .field(idx)
        .ok_or_else(|| invalid(record.line, "missing player_id"))?;

    raw.parse::<i32>()
        .map_err(|_| invalid(record.line, format!("player_id '{}' is not an integer", raw)))
}

fn age(record: &Record, idx: Option<usize>) -> Result<Option<u8>, ScoutingError> {
    let Some(idx) = idx else {
        return Ok(None);
    };

    match number(record, idx, "age")? {
        None => Ok(None),
        Some(age) if (14.0..=50.0).contains(&age) => Ok(Some(age.round() as u8)),
        Some(age) => Err(invalid(record.line, format!("age {} is out of range", age)))
    }
}

fn parse_positional(record: &Record, components: &[Component]) -> Result<ScoutingGrade, ScoutingError> {
    let id = player_id(record, 0)?;
    let name = record
        .field(1)
        .ok_or_else(|| invalid(record.line, "missing name"))?;

    let mut grade = ScoutingGrade::new(id, name);
    for (offset, &component) in components.iter().enumerate() {
        let value = number(record, 2 + offset, component.column())?
            .ok_or_else(|| invalid(record.line, format!("missing {} grade", component.column())))?;
        grade.potential.insert(component, value);
    }

    let age_idx = 2 + components.len();
    grade.age = age(record, (record.fields.len() > age_idx).then_some(age_idx))?;

    Ok(grade)
}

fn parse_with_layout(
    record: &Record,
    layout: &Layout,
    components: &[Component]
) -> Result<ScoutingGrade, ScoutingError> {
    let id_idx = layout
        .find(ID_COLUMNS)
        .ok_or_else(|| invalid(record.line, "header has no player_id column"))?;
    let id = player_id(record, id_idx)?;

    let name = layout
        .find(NAME_COLUMNS)
        .and_then(|idx| record.field(idx))
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("Player {}", id));

    let mut grade = ScoutingGrade::new(id, name);

    for &component in components {
        let idx = layout
            .find_suffixed(aliases(component), &["_pot", "_potential", ""])
            .ok_or_else(|| invalid(record.line, format!("header has no {} column", component.column())))?;
        let value = number(record, idx, component.column())?
            .ok_or_else(|| invalid(record.line, format!("missing {} grade", component.column())))?;
        grade.potential.insert(component, value);

        if let Some(idx) = layout.find_suffixed(aliases(component), &["_current", "_cur", "_ovr"]) {
            if let Some(value) = number(record, idx, component.column())? {
                grade.current.insert(component, value);
            }
        }
    }

    grade.age = age(record, layout.find(&["age"]))?;

    let stars = |names: &[&str]| -> Result<Option<f64>, ScoutingError> {
        match layout.find(names).and_then(|idx| record.field(idx)) {
            None => Ok(None),
            Some(raw) => parse_stars(raw)
                .map(Some)
                .ok_or_else(|| invalid(record.line, format!("'{}' is not a star grade", raw)))
        }
    };
    grade.overall_stars = stars(&["ovr", "overall"])?;
    grade.potential_stars = stars(&["pot", "potential"])?;

    if let Some(idx) = layout.find(&["stamina", "stm", "sta"]) {
        grade.stamina = number(record, idx, "stamina")?;
    }
    if let Some(idx) = layout.find(&["pitches", "pitch_count", "num_pitches"]) {
        grade.pitch_count = number(record, idx, "pitch count")?.map(|p| p.clamp(0.0, 10.0) as u8);
    }

    let tier = |names: &[&str]| layout.find(names).and_then(|idx| record.field(idx)).and_then(Tier::parse);
    grade.durability = tier(&["durability", "dur", "prone"]);
    grade.personality.work_ethic = tier(&["work_ethic", "we"]);
    grade.personality.intelligence = tier(&["intelligence", "int"]);
    grade.personality.leadership = tier(&["leadership", "lea", "lead"]);
    grade.personality.greed = tier(&["greed"]);
    grade.personality.loyalty = tier(&["loyalty", "loy"]);

    Ok(grade)
}

fn parse_scouting(text: &str, components: &[Component]) -> Result<Vec<ScoutingGrade>, ScoutingError> {
    let records = parse_records(text, detect_delimiter(text))?;

    let Some(first) = records.first() else {
        return Err(ScoutingError::Empty);
    };

    let mut grades = Vec::with_capacity(records.len());
    if looks_like_header(first) {
        let layout = Layout::from_header(first);
        debug!("Scouting upload has a header with {} columns", layout.columns.len());
        for record in &records[1..] {
            grades.push(parse_with_layout(record, &layout, components)?);
        }
    } else {
        for record in &records {
            grades.push(parse_positional(record, components)?);
        }
    }

    if grades.is_empty() {
        return Err(ScoutingError::Empty);
    }

    // Only clamped once the whole file has been accepted
    for grade in &mut grades {
        for value in grade.potential.values_mut().chain(grade.current.values_mut()) {
            *value = clamp_grade(*value);
        }
    }

    info!("Parsed {} scouting reports", grades.len());
    Ok(grades)
}

pub fn parse_pitcher_scouting(text: &str) -> Result<Vec<ScoutingGrade>, ScoutingError> {
    parse_scouting(text, &PITCHING_COMPONENTS)
}

pub fn parse_hitter_scouting(text: &str) -> Result<Vec<ScoutingGrade>, ScoutingError> {
    parse_scouting(text, &HITTING_COMPONENTS)
}
