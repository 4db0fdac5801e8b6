use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// A rated skill. Each component is measured by exactly one [`Metric`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Component {
    // Pitching
    Stuff,
    Control,
    Hra,
    // Hitting
    Eye,
    AvoidK,
    Power,
    Contact,
    Gap,
    Speed
}

pub const PITCHING_COMPONENTS: [Component; 3] = [Component::Stuff, Component::Control, Component::Hra];

pub const HITTING_COMPONENTS: [Component; 6] = [
    Component::Eye,
    Component::AvoidK,
    Component::Power,
    Component::Contact,
    Component::Gap,
    Component::Speed
];

impl Component {
    pub fn metric(&self) -> Metric {
        match self {
            Component::Stuff => Metric::K9,
            Component::Control => Metric::Bb9,
            Component::Hra => Metric::Hr9,
            Component::Eye => Metric::BbPct,
            Component::AvoidK => Metric::KPct,
            Component::Power => Metric::HrPct,
            Component::Contact => Metric::Babip,
            Component::Gap => Metric::XbhRate,
            Component::Speed => Metric::SbRate
        }
    }

    pub fn is_pitching(&self) -> bool {
        PITCHING_COMPONENTS.contains(self)
    }

    /// Whether the underlying rate improves as it grows.
    pub fn higher_is_better(&self) -> bool {
        self.metric().higher_is_better()
    }

    /// Baserunning has no minor-league stat that tracks development, so its
    /// development curve is borrowed from the other hitting components.
    pub fn has_raw_equivalent(&self) -> bool {
        !matches!(self, Component::Speed)
    }

    /// Column header used by scouting uploads.
    pub fn column(&self) -> &'static str {
        match self {
            Component::Stuff => "stuff",
            Component::Control => "control",
            Component::Hra => "hra",
            Component::Eye => "eye",
            Component::AvoidK => "avoid_k",
            Component::Power => "power",
            Component::Contact => "contact",
            Component::Gap => "gap",
            Component::Speed => "speed"
        }
    }

    pub fn for_pitchers(pitcher: bool) -> &'static [Component] {
        if pitcher {
            &PITCHING_COMPONENTS
        } else {
            &HITTING_COMPONENTS
        }
    }
}

/// A rate statistic against which reference distributions are built.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Strikeouts per nine innings
    K9,
    /// Walks per nine innings
    Bb9,
    /// Home runs allowed per nine innings
    Hr9,
    Fip,
    /// Walks per 100 plate appearances
    BbPct,
    /// Strikeouts per 100 plate appearances
    KPct,
    /// Home runs per 100 plate appearances
    HrPct,
    /// Hit rate on balls in play
    Babip,
    /// Doubles and triples per at-bat
    XbhRate,
    /// Stolen bases per plate appearance
    SbRate,
    Woba
}

impl Metric {
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, Metric::Bb9 | Metric::Hr9 | Metric::Fip | Metric::KPct)
    }

    pub fn is_pitching(&self) -> bool {
        matches!(self, Metric::K9 | Metric::Bb9 | Metric::Hr9 | Metric::Fip)
    }

    /// The single-number value metric for a player type.
    pub fn aggregate(pitcher: bool) -> Metric {
        if pitcher {
            Metric::Fip
        } else {
            Metric::Woba
        }
    }
}
