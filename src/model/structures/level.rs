use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::EnumIter;

/// Competition level, ordered from the top (MLB) down.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
#[repr(u8)]
pub enum Level {
    Mlb = 1,
    Aaa = 2,
    Aa = 3,
    A = 4,
    Rookie = 5
}

impl Level {
    pub fn is_mlb(&self) -> bool {
        *self == Level::Mlb
    }

    /// Levels between this one and MLB, in the order an adjustment walks them.
    /// `Aa` yields `[Aa, Aaa]`: the AA→AAA step followed by the AAA→MLB step.
    pub fn steps_to_mlb(&self) -> Vec<Level> {
        let mut steps = Vec::new();
        let mut level = *self;
        while let Some(up) = level.next_up() {
            steps.push(level);
            level = up;
        }

        steps
    }

    pub fn next_up(&self) -> Option<Level> {
        match self {
            Level::Mlb => None,
            Level::Aaa => Some(Level::Mlb),
            Level::Aa => Some(Level::Aaa),
            Level::A => Some(Level::Aa),
            Level::Rookie => Some(Level::A)
        }
    }

    /// Parses the short labels used in scouting and stats exports (`mlb`, `aaa`, `r` ...).
    pub fn from_label(label: &str) -> Option<Level> {
        match label.trim().to_ascii_lowercase().as_str() {
            "mlb" | "ml" => Some(Level::Mlb),
            "aaa" => Some(Level::Aaa),
            "aa" => Some(Level::Aa),
            "a" => Some(Level::A),
            "r" | "rookie" | "rk" => Some(Level::Rookie),
            _ => None
        }
    }
}

impl TryFrom<i32> for Level {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Level::Mlb),
            2 => Ok(Level::Aaa),
            3 => Ok(Level::Aa),
            4 => Ok(Level::A),
            5 => Ok(Level::Rookie),
            _ => Err(())
        }
    }
}
