use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum StopType {
    City,
    Town,
    Offmap,
    Mine,
    Port,
    Pass,
}

impl StopType {
    pub const ALL: [StopType; 6] = [
        StopType::City,
        StopType::Town,
        StopType::Offmap,
        StopType::Mine,
        StopType::Port,
        StopType::Pass,
    ];
}

/// Permission for a train to end at, or pass through, a stop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunPermission {
    Yes,
    No,
    TokenOnly,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScoreType {
    Major,
    Minor,
    No,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TileColour {
    Red,
    Fixed,
    White,
    Yellow,
    Green,
    Brown,
    Grey,
}

/// Game-wide strictness used when checking that a new tile continues the
/// acting company's network.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING-KEBAB-CASE", ascii_case_insensitive)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum RouteAlgorithm {
    Permissive,
    #[default]
    Restrictive,
    SemiRestrictive,
}

impl RouteAlgorithm {
    pub fn is_strict(self) -> bool {
        !matches!(self, RouteAlgorithm::Permissive)
    }
}
