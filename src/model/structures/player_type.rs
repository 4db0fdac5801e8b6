use serde_repr::{Deserialize_repr, Serialize_repr};
use std::{convert::TryFrom, fmt};
use strum_macros::EnumIter;

#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u8)]
pub enum PlayerType {
    Hitter = 0,
    Starter = 1,
    Reliever = 2
}

impl PlayerType {
    pub fn is_pitcher(&self) -> bool {
        matches!(self, PlayerType::Starter | PlayerType::Reliever)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerType::Hitter => "hitter",
            PlayerType::Starter => "starter",
            PlayerType::Reliever => "reliever"
        }
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for PlayerType {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(PlayerType::Hitter),
            1 => Ok(PlayerType::Starter),
            2 => Ok(PlayerType::Reliever),
            _ => Err(())
        }
    }
}
