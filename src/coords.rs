use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::config::ConfigError;

/// One of the six edges of a hex, numbered 0..5 clockwise.
///
/// Values only come from [`HexSide::ALL`], so every side in the program is one
/// of six shared constants and arithmetic is always taken modulo 6.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(from = "i32", into = "i32")]
pub struct HexSide(u8);

impl HexSide {
    pub const ALL: [HexSide; 6] = [
        HexSide(0),
        HexSide(1),
        HexSide(2),
        HexSide(3),
        HexSide(4),
        HexSide(5),
    ];

    pub const fn get(number: i32) -> HexSide {
        HexSide::ALL[number.rem_euclid(6) as usize]
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    pub const fn opposite(self) -> HexSide {
        HexSide::get(self.0 as i32 + 3)
    }

    pub const fn negative(self) -> HexSide {
        HexSide::get(-(self.0 as i32))
    }

    pub const fn rotate(self, by: HexSide) -> HexSide {
        HexSide::get(self.0 as i32 + by.0 as i32)
    }

    const fn bit(self) -> u8 {
        1 << self.0
    }
}

impl Default for HexSide {
    fn default() -> Self {
        HexSide::get(0)
    }
}

impl From<i32> for HexSide {
    fn from(number: i32) -> Self {
        HexSide::get(number)
    }
}

impl From<HexSide> for i32 {
    fn from(side: HexSide) -> Self {
        side.0 as i32
    }
}

impl fmt::Display for HexSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of hex sides stored as six bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HexSides(u8);

impl HexSides {
    pub const EMPTY: HexSides = HexSides(0);
    pub const ALL: HexSides = HexSides(0b11_1111);

    pub fn contains(self, side: HexSide) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn insert(&mut self, side: HexSide) {
        self.0 |= side.bit();
    }

    pub fn remove(&mut self, side: HexSide) {
        self.0 &= !side.bit();
    }

    pub fn with(mut self, side: HexSide) -> Self {
        self.insert(side);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: HexSides) -> HexSides {
        HexSides(self.0 | other.0)
    }

    pub fn intersection(self, other: HexSides) -> HexSides {
        HexSides(self.0 & other.0)
    }

    pub fn difference(self, other: HexSides) -> HexSides {
        HexSides(self.0 & !other.0)
    }

    pub fn intersects(self, other: HexSides) -> bool {
        self.0 & other.0 != 0
    }

    /// Every member side rotated clockwise by `by`.
    pub fn rotate(self, by: HexSide) -> HexSides {
        let k = by.number() as u32;
        if k == 0 {
            return self;
        }
        let bits = self.0 as u32;
        HexSides((((bits << k) | (bits >> (6 - k))) & 0b11_1111) as u8)
    }

    pub fn iter(self) -> impl Iterator<Item = HexSide> {
        HexSide::ALL.into_iter().filter(move |side| self.contains(*side))
    }
}

impl FromIterator<HexSide> for HexSides {
    fn from_iter<I: IntoIterator<Item = HexSide>>(iter: I) -> Self {
        let mut sides = HexSides::EMPTY;
        for side in iter {
            sides.insert(side);
        }
        sides
    }
}

impl fmt::Display for HexSides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|side| side.to_string()).collect();
        write!(f, "[{}]", parts.join(","))
    }
}

/// Doubled-offset hex coordinate: letters name the row, digits the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub row: i32,
    pub col: i32,
}

impl HexCoord {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidHexName(name.to_string());
        let split = name
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(invalid)?;
        let (letters, digits) = name.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(invalid());
        }
        let row = letters
            .bytes()
            .try_fold(0i32, |acc, b| {
                acc.checked_mul(26)?.checked_add(i32::from(b - b'A' + 1))
            })
            .ok_or_else(invalid)?;
        let col = digits.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self { row, col })
    }

    pub fn name(&self) -> String {
        let mut letters = Vec::new();
        let mut row = self.row;
        while row > 0 {
            let rem = (row - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            row = (row - 1) / 26;
        }
        letters.reverse();
        let letters: String = letters.into_iter().collect();
        format!("{letters}{}", self.col)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

const NS_ROW_DELTA: [i32; 6] = [2, 1, -1, -2, -1, 1];
const NS_COL_DELTA: [i32; 6] = [0, -1, -1, 0, 1, 1];
const EW_ROW_DELTA: [i32; 6] = [1, 0, -1, -1, 0, 1];
const EW_COL_DELTA: [i32; 6] = [-1, -2, -1, 1, 2, 1];

const NS_LABELS: [&str; 6] = ["S", "SW", "NW", "N", "NE", "SE"];
const EW_LABELS: [&str; 6] = ["SW", "W", "NW", "NE", "E", "SE"];

static SIDES_BY_LABEL: Lazy<HashMap<MapOrientation, HashMap<&'static str, HexSide>>> =
    Lazy::new(|| {
        MapOrientation::iter()
            .map(|orientation| {
                let labels = HexSide::ALL
                    .into_iter()
                    .map(|side| (orientation.side_label(side), side))
                    .collect();
                (orientation, labels)
            })
            .collect()
    });

/// Global hex grid orientation: `NS` hexes have flat north and south edges,
/// `EW` hexes have flat east and west edges.
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
#[strum(ascii_case_insensitive)]
pub enum MapOrientation {
    #[default]
    NS,
    EW,
}

impl MapOrientation {
    pub fn adjacent_coordinates(self, origin: HexCoord, side: HexSide) -> HexCoord {
        let idx = side.number() as usize;
        let (row_delta, col_delta) = match self {
            MapOrientation::NS => (NS_ROW_DELTA[idx], NS_COL_DELTA[idx]),
            MapOrientation::EW => (EW_ROW_DELTA[idx], EW_COL_DELTA[idx]),
        };
        HexCoord::new(origin.row + row_delta, origin.col + col_delta)
    }

    pub fn side_label(self, side: HexSide) -> &'static str {
        let idx = side.number() as usize;
        match self {
            MapOrientation::NS => NS_LABELS[idx],
            MapOrientation::EW => EW_LABELS[idx],
        }
    }

    /// Looks a side up by its compass label, ignoring case.
    pub fn side_by_label(self, label: &str) -> Option<HexSide> {
        let label = label.trim().to_ascii_uppercase();
        SIDES_BY_LABEL.get(&self)?.get(label.as_str()).copied()
    }

    /// The side of `from` that faces `to`, if the two hexes are adjacent.
    pub fn side_towards(self, from: HexCoord, to: HexCoord) -> Option<HexSide> {
        HexSide::ALL
            .into_iter()
            .find(|side| self.adjacent_coordinates(from, *side) == to)
    }
}
