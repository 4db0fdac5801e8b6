use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{convert::TryFrom, fmt};
use strum_macros::EnumIter;

#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum StatKind {
    Pitching = 0,
    Batting = 1
}

impl StatKind {
    /// Path segment and cache namespace for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Pitching => "pitching",
            StatKind::Batting => "batting"
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for StatKind {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(StatKind::Pitching),
            1 => Ok(StatKind::Batting),
            _ => Err(())
        }
    }
}
