use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::config::UpgradeConfig;
use crate::coords::{HexSide, HexSides};
use crate::tile::{Tile, TileId};
use crate::track::{Track, TrackPoint};

/// A configured rule allowing one tile to replace another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileUpgrade {
    pub target: TileId,
    allowed_hexes: BTreeSet<String>,
    excluded_hexes: BTreeSet<String>,
    allowed_phases: BTreeSet<String>,
    station_map: BTreeMap<u8, u8>,
}

impl TileUpgrade {
    pub fn new(target: impl Into<TileId>) -> Self {
        Self {
            target: target.into(),
            allowed_hexes: BTreeSet::new(),
            excluded_hexes: BTreeSet::new(),
            allowed_phases: BTreeSet::new(),
            station_map: BTreeMap::new(),
        }
    }

    pub fn from_config(target: &str, config: &UpgradeConfig) -> Self {
        Self {
            target: target.to_string(),
            allowed_hexes: config.hexes.iter().cloned().collect(),
            excluded_hexes: config.excluded_hexes.iter().cloned().collect(),
            allowed_phases: config.phases.iter().cloned().collect(),
            station_map: config.station_map.clone(),
        }
    }

    pub fn only_on_hexes<I, S>(mut self, hexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_hexes = hexes.into_iter().map(Into::into).collect();
        self
    }

    pub fn excluding_hexes<I, S>(mut self, hexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_hexes = hexes.into_iter().map(Into::into).collect();
        self
    }

    pub fn only_in_phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_phases = phases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_station_map(mut self, station_map: BTreeMap<u8, u8>) -> Self {
        self.station_map = station_map;
        self
    }

    pub fn is_allowed_for_hex(&self, hex: &str) -> bool {
        if self.excluded_hexes.contains(hex) {
            return false;
        }
        self.allowed_hexes.is_empty() || self.allowed_hexes.contains(hex)
    }

    pub fn is_allowed_for_phase(&self, phase: &str) -> bool {
        self.allowed_phases.is_empty() || self.allowed_phases.contains(phase)
    }

    /// Every rotation (relative to `base`) at which `target` keeps all of the
    /// base tile's track. Rotations that give the same track layout as an
    /// earlier one are skipped.
    pub fn placements(&self, base: &Tile, target: &Tile) -> Vec<Placement> {
        let mappings = self.station_mappings(base, target);
        let mut seen: Vec<BTreeSet<Track>> = Vec::new();
        let mut placements = Vec::new();

        for rotation in HexSide::ALL {
            let tracks: BTreeSet<Track> = target
                .tracks()
                .iter()
                .map(|track| track.create_by_rotation(rotation))
                .collect();
            if seen.contains(&tracks) {
                continue;
            }
            for mapping in &mappings {
                let preserved: BTreeSet<Track> = base
                    .tracks()
                    .iter()
                    .map(|track| track.create_by_station_mapping(mapping))
                    .collect();
                if preserved.is_subset(&tracks) {
                    let new_tracks = tracks.difference(&preserved).copied().collect();
                    placements.push(Placement {
                        rotation,
                        tracks: tracks.clone(),
                        new_tracks,
                        station_map: mapping.clone(),
                    });
                    break;
                }
            }
            seen.push(tracks);
        }
        placements
    }

    /// Candidate base-to-target station numberings, identity first.
    fn station_mappings(&self, base: &Tile, target: &Tile) -> Vec<BTreeMap<u8, u8>> {
        if !self.station_map.is_empty() {
            return vec![self.station_map.clone()];
        }
        let from: Vec<u8> = base.stations().iter().map(|s| s.number).collect();
        let to: Vec<u8> = target.stations().iter().map(|s| s.number).collect();
        if from.is_empty() || to.is_empty() {
            return vec![BTreeMap::new()];
        }
        if from.len() <= to.len() {
            to.iter()
                .copied()
                .permutations(from.len())
                .map(|image| from.iter().copied().zip(image).collect())
                .collect()
        } else {
            // more stations on the base than the target: cities merge
            (0..from.len())
                .map(|_| to.iter().copied())
                .multi_cartesian_product()
                .map(|image| from.iter().copied().zip(image).collect())
                .collect()
        }
    }
}

/// A target tile at one rotation that preserves the base tile's track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Relative to the rotation of the base tile.
    pub rotation: HexSide,
    pub tracks: BTreeSet<Track>,
    pub new_tracks: BTreeSet<Track>,
    pub station_map: BTreeMap<u8, u8>,
}

impl Placement {
    pub fn sides(&self) -> HexSides {
        self.tracks
            .iter()
            .fold(HexSides::EMPTY, |acc, track| acc.union(track.sides()))
    }

    pub fn new_sides(&self) -> HexSides {
        self.new_tracks
            .iter()
            .fold(HexSides::EMPTY, |acc, track| acc.union(track.sides()))
    }

    /// Whether some new track can be reached from the `connected` sides
    /// along this placement's track. With `through_stations` unset the walk
    /// may end at a station but never continues past one.
    pub fn reaches_new_track(&self, connected: HexSides, through_stations: bool) -> bool {
        let mut reached: HashSet<TrackPoint> = connected.iter().map(TrackPoint::Side).collect();
        let mut queue: VecDeque<TrackPoint> = reached.iter().copied().collect();

        while let Some(point) = queue.pop_front() {
            if point.is_station() && !through_stations {
                continue;
            }
            for track in &self.tracks {
                if let Some(next) = track.other_end(point) {
                    if reached.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
        }

        self.new_tracks
            .iter()
            .any(|track| track.points().iter().any(|point| reached.contains(point)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::tests::{plain_tile, station_tile};
    use crate::types::{StopType, TileColour};

    fn rotations(placements: &[Placement]) -> Vec<u8> {
        placements.iter().map(|p| p.rotation.number()).collect()
    }

    #[test]
    fn empty_base_allows_every_distinct_rotation() {
        let empty = plain_tile("0", TileColour::White, &[]);
        let straight = plain_tile("9", TileColour::Yellow, &[("side0", "side3")]);
        let gentle = plain_tile("8", TileColour::Yellow, &[("side0", "side2")]);

        // a straight track repeats after three rotations
        let upgrade = TileUpgrade::new("9");
        assert_eq!(rotations(&upgrade.placements(&empty, &straight)), vec![0, 1, 2]);
        assert_eq!(upgrade.placements(&empty, &gentle).len(), 6);
    }

    #[test]
    fn upgrade_must_keep_existing_track() {
        let straight = plain_tile("9", TileColour::Yellow, &[("side0", "side3")]);
        let x = plain_tile(
            "24",
            TileColour::Green,
            &[("side0", "side3"), ("side3", "side5")],
        );
        let placements = TileUpgrade::new("24").placements(&straight, &x);
        // 0-3 is symmetric, so it survives both at rotation 0 and rotation 3
        assert_eq!(rotations(&placements), vec![0, 3]);
        let first = &placements[0];
        assert_eq!(first.new_tracks.len(), 1);
        assert_eq!(first.new_sides(), HexSides::EMPTY.with(HexSide::get(3)).with(HexSide::get(5)));
    }

    #[test]
    fn station_tracks_follow_the_mapping() {
        let yellow_city = station_tile(
            "5",
            TileColour::Yellow,
            &[StopType::City],
            &[("city1", "side0"), ("city1", "side1")],
        );
        let green_city = station_tile(
            "15",
            TileColour::Green,
            &[StopType::City],
            &[
                ("city1", "side0"),
                ("city1", "side1"),
                ("city1", "side2"),
                ("city1", "side3"),
            ],
        );
        let placements = TileUpgrade::new("15").placements(&yellow_city, &green_city);
        assert_eq!(rotations(&placements), vec![0, 4, 5]);
        assert!(placements.iter().all(|p| p.station_map == BTreeMap::from([(1, 1)])));
    }

    #[test]
    fn two_cities_may_swap_numbers() {
        let base = station_tile(
            "OO",
            TileColour::Yellow,
            &[StopType::City, StopType::City],
            &[("city1", "side0"), ("city2", "side3")],
        );
        let target = station_tile(
            "OO2",
            TileColour::Green,
            &[StopType::City, StopType::City],
            &[
                ("city2", "side0"),
                ("city2", "side1"),
                ("city1", "side3"),
                ("city1", "side4"),
            ],
        );
        let placements = TileUpgrade::new("OO2").placements(&base, &target);
        let at_zero = placements
            .iter()
            .find(|p| p.rotation == HexSide::get(0))
            .unwrap();
        assert_eq!(at_zero.station_map, BTreeMap::from([(1, 2), (2, 1)]));
    }

    #[test]
    fn explicit_station_map_wins() {
        let base = station_tile(
            "OO",
            TileColour::Yellow,
            &[StopType::City, StopType::City],
            &[("city1", "side0"), ("city2", "side3")],
        );
        let merged = station_tile(
            "M",
            TileColour::Green,
            &[StopType::City],
            &[("city1", "side0"), ("city1", "side3")],
        );
        let upgrade = TileUpgrade::new("M").with_station_map(BTreeMap::from([(1, 1), (2, 1)]));
        let placements = upgrade.placements(&base, &merged);
        assert_eq!(rotations(&placements), vec![0]);
        assert_eq!(placements[0].new_tracks.len(), 0);
    }

    #[test]
    fn reachability_respects_stations() {
        let base = station_tile(
            "57",
            TileColour::Yellow,
            &[StopType::City],
            &[("city1", "side0"), ("city1", "side2")],
        );
        let target = station_tile(
            "X",
            TileColour::Green,
            &[StopType::City],
            &[
                ("city1", "side0"),
                ("city1", "side2"),
                ("side2", "side4"),
            ],
        );
        let placement = TileUpgrade::new("X")
            .placements(&base, &target)
            .into_iter()
            .find(|p| p.rotation == HexSide::get(0))
            .unwrap();
        let from_zero = HexSides::EMPTY.with(HexSide::get(0));
        assert!(placement.reaches_new_track(from_zero, true));
        assert!(!placement.reaches_new_track(from_zero, false));
        assert!(placement.reaches_new_track(HexSides::EMPTY.with(HexSide::get(2)), false));
    }

    #[test]
    fn hex_and_phase_restrictions() {
        let upgrade = TileUpgrade::new("14")
            .only_on_hexes(["B4", "C5"])
            .excluding_hexes(["C5"])
            .only_in_phases(["3"]);
        assert!(upgrade.is_allowed_for_hex("B4"));
        assert!(!upgrade.is_allowed_for_hex("C5"));
        assert!(!upgrade.is_allowed_for_hex("D6"));
        assert!(upgrade.is_allowed_for_phase("3"));
        assert!(!upgrade.is_allowed_for_phase("2"));
        assert!(TileUpgrade::new("14").is_allowed_for_phase("2"));
    }
}
