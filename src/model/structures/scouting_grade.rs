use crate::model::structures::component::Component;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const GRADE_FLOOR: f64 = 20.0;
pub const GRADE_CEILING: f64 = 80.0;

/// Low / normal / high bucket used for durability and personality traits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Low,
    Normal,
    High
}

impl Tier {
    /// Accepts `H`/`N`/`L` and the spelled-out forms; `U` (unknown) and blanks are `None`.
    pub fn parse(value: &str) -> Option<Tier> {
        match value.trim().to_ascii_uppercase().as_str() {
            "H" | "HIGH" => Some(Tier::High),
            "N" | "NORMAL" | "AVERAGE" => Some(Tier::Normal),
            "L" | "LOW" => Some(Tier::Low),
            _ => None
        }
    }
}

/// Personality traits. Carried through for narrative consumers, never rated.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Personality {
    pub work_ethic: Option<Tier>,
    pub intelligence: Option<Tier>,
    pub leadership: Option<Tier>,
    pub greed: Option<Tier>,
    pub loyalty: Option<Tier>
}

/// One player's scouting report on the 20–80 scale.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScoutingGrade {
    pub player_id: i32,
    pub name: String,
    pub age: Option<u8>,
    /// Projected peak grades
    pub potential: BTreeMap<Component, f64>,
    /// Present-day grades, when the report has them
    pub current: BTreeMap<Component, f64>,
    pub overall_stars: Option<f64>,
    pub potential_stars: Option<f64>,
    pub stamina: Option<f64>,
    pub pitch_count: Option<u8>,
    pub durability: Option<Tier>,
    pub personality: Personality
}

impl ScoutingGrade {
    pub fn new(player_id: i32, name: impl Into<String>) -> ScoutingGrade {
        ScoutingGrade {
            player_id,
            name: name.into(),
            age: None,
            potential: BTreeMap::new(),
            current: BTreeMap::new(),
            overall_stars: None,
            potential_stars: None,
            stamina: None,
            pitch_count: None,
            durability: None,
            personality: Personality::default()
        }
    }

    pub fn potential(&self, component: Component) -> Option<f64> {
        self.potential.get(&component).copied()
    }

    /// Current grade, falling back to the potential grade for reports that only carry one.
    pub fn current(&self, component: Component) -> Option<f64> {
        self.current
            .get(&component)
            .or_else(|| self.potential.get(&component))
            .copied()
    }

    pub fn is_pitcher_report(&self) -> bool {
        self.potential.keys().any(|c| c.is_pitching())
    }

    /// Stars still to be gained, `None` without both star grades.
    pub fn star_gap(&self) -> Option<f64> {
        Some(self.potential_stars? - self.overall_stars?)
    }
}

/// Parses `"4.5 Stars"`, `"1 Star"` or a bare number.
pub fn parse_stars(value: &str) -> Option<f64> {
    let trimmed = value
        .trim()
        .trim_end_matches("Stars")
        .trim_end_matches("Star")
        .trim_end_matches("stars")
        .trim_end_matches("star")
        .trim();

    trimmed.parse::<f64>().ok().filter(|v| (0.0..=5.0).contains(v))
}

pub fn clamp_grade(grade: f64) -> f64 {
    grade.clamp(GRADE_FLOOR, GRADE_CEILING)
}

#[cfg(test)]
mod tests {
    use crate::model::structures::{
        component::Component,
        scouting_grade::{parse_stars, ScoutingGrade, Tier}
    };

    #[test]
    fn test_parse_stars() {
        assert_eq!(parse_stars("4.5 Stars"), Some(4.5));
        assert_eq!(parse_stars("1 Star"), Some(1.0));
        assert_eq!(parse_stars("3"), Some(3.0));
        assert_eq!(parse_stars("7 Stars"), None);
        assert_eq!(parse_stars(""), None);
    }

    #[test]
    fn test_parse_tier() {
        assert_eq!(Tier::parse("H"), Some(Tier::High));
        assert_eq!(Tier::parse("normal"), Some(Tier::Normal));
        assert_eq!(Tier::parse("L"), Some(Tier::Low));
        assert_eq!(Tier::parse("U"), None);
    }

    #[test]
    fn test_current_falls_back_to_potential() {
        let mut grade = ScoutingGrade::new(1, "Test Pitcher");
        grade.potential.insert(Component::Stuff, 65.0);
        grade.potential.insert(Component::Control, 50.0);
        grade.current.insert(Component::Stuff, 45.0);

        assert_eq!(grade.current(Component::Stuff), Some(45.0));
        assert_eq!(grade.current(Component::Control), Some(50.0));
        assert_eq!(grade.current(Component::Hra), None);
        assert!(grade.is_pitcher_report());
    }

    #[test]
    fn test_star_gap() {
        let mut grade = ScoutingGrade::new(1, "Raw Prospect");
        assert_eq!(grade.star_gap(), None);

        grade.overall_stars = Some(1.5);
        grade.potential_stars = Some(4.5);
        assert_eq!(grade.star_gap(), Some(3.0));
    }
}
