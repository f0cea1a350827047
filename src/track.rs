use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::coords::{HexSide, HexSides};

/// An endpoint of track on a tile: a hex edge or a station inside the tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackPoint {
    Side(HexSide),
    /// 1-based station number on the tile.
    Station(u8),
}

impl TrackPoint {
    /// Sides are numbered 0..5, stations `-number`.
    pub fn number(self) -> i32 {
        match self {
            TrackPoint::Side(side) => side.number() as i32,
            TrackPoint::Station(number) => -(number as i32),
        }
    }

    pub fn side(self) -> Option<HexSide> {
        match self {
            TrackPoint::Side(side) => Some(side),
            TrackPoint::Station(_) => None,
        }
    }

    pub fn is_station(self) -> bool {
        matches!(self, TrackPoint::Station(_))
    }

    pub fn rotate(self, by: HexSide) -> TrackPoint {
        match self {
            TrackPoint::Side(side) => TrackPoint::Side(side.rotate(by)),
            station => station,
        }
    }

    /// Parses `sideN` or `cityN` (case-insensitive).
    pub fn parse(input: &str) -> Result<TrackPoint, ConfigError> {
        let malformed = || ConfigError::MalformedTrackPoint(input.to_string());
        let lower = input.trim().to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("side") {
            let number: i32 = rest.parse().map_err(|_| malformed())?;
            if !(0..6).contains(&number) {
                return Err(malformed());
            }
            Ok(TrackPoint::Side(HexSide::get(number)))
        } else if let Some(rest) = lower.strip_prefix("city") {
            let number: u8 = rest.parse().map_err(|_| malformed())?;
            if number == 0 {
                return Err(malformed());
            }
            Ok(TrackPoint::Station(number))
        } else {
            Err(malformed())
        }
    }
}

impl Ord for TrackPoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number().cmp(&other.number())
    }
}

impl PartialOrd for TrackPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TrackPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackPoint::Side(side) => write!(f, "side{side}"),
            TrackPoint::Station(number) => write!(f, "city{number}"),
        }
    }
}

/// One piece of rail between two track points. Endpoint order is not
/// significant: the constructor stores the lower point first.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Track {
    start: TrackPoint,
    end: TrackPoint,
}

impl Track {
    pub fn new(a: TrackPoint, b: TrackPoint) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn parse(from: &str, to: &str) -> Result<Self, ConfigError> {
        Ok(Track::new(TrackPoint::parse(from)?, TrackPoint::parse(to)?))
    }

    pub fn start(&self) -> TrackPoint {
        self.start
    }

    pub fn end(&self) -> TrackPoint {
        self.end
    }

    pub fn key(&self) -> i32 {
        12 * self.start.number() + self.end.number()
    }

    pub fn points(&self) -> [TrackPoint; 2] {
        [self.start, self.end]
    }

    pub fn has_point(&self, point: TrackPoint) -> bool {
        self.start == point || self.end == point
    }

    pub fn sides(&self) -> HexSides {
        self.points().into_iter().filter_map(TrackPoint::side).collect()
    }

    /// The endpoint opposite `point`, if `point` is on this track.
    pub fn other_end(&self, point: TrackPoint) -> Option<TrackPoint> {
        if self.start == point {
            Some(self.end)
        } else if self.end == point {
            Some(self.start)
        } else {
            None
        }
    }

    pub fn create_by_rotation(&self, by: HexSide) -> Track {
        Track::new(self.start.rotate(by), self.end.rotate(by))
    }

    /// Renumbers station endpoints; stations missing from `mapping` keep
    /// their number.
    pub fn create_by_station_mapping(&self, mapping: &BTreeMap<u8, u8>) -> Track {
        let remap = |point: TrackPoint| match point {
            TrackPoint::Station(number) => {
                TrackPoint::Station(mapping.get(&number).copied().unwrap_or(number))
            }
            side => side,
        };
        Track::new(remap(self.start), remap(self.end))
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for Track {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for Track {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn point(n: i32) -> TrackPoint {
        if n >= 0 {
            TrackPoint::Side(HexSide::get(n))
        } else {
            TrackPoint::Station((-n) as u8)
        }
    }

    proptest! {
        #[test]
        fn track_is_order_independent(a in -3i32..6, b in -3i32..6) {
            prop_assume!(a != b);
            let forward = Track::new(point(a), point(b));
            let backward = Track::new(point(b), point(a));
            prop_assert_eq!(forward, backward);
            prop_assert_eq!(forward.key(), backward.key());
            prop_assert!(forward.start() <= forward.end());
        }
    }

    #[test]
    fn parses_side_and_city_endpoints() {
        assert_eq!(
            TrackPoint::parse("side4").unwrap(),
            TrackPoint::Side(HexSide::get(4))
        );
        assert_eq!(TrackPoint::parse("City2").unwrap(), TrackPoint::Station(2));
        assert_eq!(TrackPoint::parse("city1").unwrap().number(), -1);
    }

    #[test]
    fn rejects_malformed_endpoints() {
        for bad in ["side6", "city0", "town1", "side", "cityX", ""] {
            assert!(
                matches!(TrackPoint::parse(bad), Err(ConfigError::MalformedTrackPoint(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rotation_moves_sides_but_not_stations() {
        let track = Track::parse("city1", "side5").unwrap();
        let rotated = track.create_by_rotation(HexSide::get(2));
        assert_eq!(rotated, Track::parse("side1", "city1").unwrap());
        assert_eq!(rotated.sides(), HexSides::EMPTY.with(HexSide::get(1)));
    }

    #[test]
    fn station_mapping_rewires_endpoints() {
        let track = Track::parse("city2", "side0").unwrap();
        let mapping = BTreeMap::from([(2, 1)]);
        assert_eq!(
            track.create_by_station_mapping(&mapping),
            Track::parse("side0", "city1").unwrap()
        );
        assert_eq!(track.create_by_station_mapping(&BTreeMap::new()), track);
    }

    #[test]
    fn other_end_walks_the_track() {
        let track = Track::parse("side0", "side3").unwrap();
        assert_eq!(
            track.other_end(point(3)),
            Some(TrackPoint::Side(HexSide::get(0)))
        );
        assert_eq!(track.other_end(point(1)), None);
    }
}
