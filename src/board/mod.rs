use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::access::{Access, AccessDefaults};
use crate::config::{ConfigError, HexConfig, MapConfig};
use crate::coords::{HexCoord, HexSide, HexSides, MapOrientation};
use crate::game::CompanyId;
use crate::tile::{Tile, TileManager};
use crate::track::Track;

pub mod stop;

pub use stop::{AccessContext, Stop};

/// Rejected map mutations. These are caller errors: the candidate lists in
/// [`crate::upgrade`] only offer lays that succeed.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("unknown hex {0}")]
    UnknownHex(String),
    #[error("unknown tile {0}")]
    UnknownTile(String),
    #[error("tile {target} is not an upgrade of tile {current} on hex {hex}")]
    NotAnUpgrade {
        hex: String,
        current: String,
        target: String,
    },
    #[error("tile {tile} cannot be laid on hex {hex} at rotation {rotation}")]
    InvalidRotation {
        hex: String,
        tile: String,
        rotation: HexSide,
    },
    #[error("tile {tile} at rotation {rotation} runs new track off hex {hex} across sides {sides}")]
    ClosedEdge {
        hex: String,
        tile: String,
        rotation: HexSide,
        sides: HexSides,
    },
    #[error("no tiles {0} left")]
    NoTilesLeft(String),
    #[error("hex {hex} has no stop {stop}")]
    UnknownStop { hex: String, stop: u8 },
    #[error("stop {stop} on hex {hex} has no free token slot")]
    StopFull { hex: String, stop: u8 },
    #[error("{company} already has a token on hex {hex}")]
    DuplicateToken { hex: String, company: CompanyId },
    #[error("merging stops on hex {hex} would put {tokens} tokens in {slots} slots")]
    TokenOverflow {
        hex: String,
        tokens: usize,
        slots: usize,
    },
}

#[derive(Debug, Clone)]
pub struct MapHex {
    id: String,
    coord: HexCoord,
    tile: Arc<Tile>,
    rotation: HexSide,
    stops: BTreeMap<u8, Stop>,
    access: Option<Access>,
    declared_invalid: HexSides,
    impassable_neighbours: BTreeSet<String>,
    invalid_sides: HexSides,
    impassable_sides: HexSides,
    blocked_for_tile_lays: bool,
}

impl MapHex {
    /// One stop per station of `tile`, numbered like the stations.
    pub fn new(id: &str, tile: Arc<Tile>, rotation: HexSide) -> Result<Self, ConfigError> {
        let coord = HexCoord::from_name(id)?;
        let stops = tile
            .stations()
            .iter()
            .map(|station| (station.number, Stop::new(station.number, Arc::clone(station))))
            .collect();
        Ok(Self {
            id: id.to_string(),
            coord,
            tile,
            rotation,
            stops,
            access: None,
            declared_invalid: HexSides::EMPTY,
            impassable_neighbours: BTreeSet::new(),
            invalid_sides: HexSides::EMPTY,
            impassable_sides: HexSides::EMPTY,
            blocked_for_tile_lays: false,
        })
    }

    pub fn from_config(config: &HexConfig, tiles: &TileManager) -> Result<Self, ConfigError> {
        let owner = format!("hex {}", config.name);
        let tile = tiles
            .tile(&config.tile)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownTile {
                owner: owner.clone(),
                tile: config.tile.clone(),
            })?;
        if !(0..6).contains(&config.rotation) {
            return Err(ConfigError::InvalidSide {
                owner,
                side: config.rotation,
            });
        }
        let mut hex = MapHex::new(&config.name, tile, HexSide::get(config.rotation))?;
        for &side in &config.invalid_sides {
            if !(0..6).contains(&side) {
                return Err(ConfigError::InvalidSide { owner, side });
            }
            hex.declared_invalid.insert(HexSide::get(side));
        }
        hex.impassable_neighbours = config.impassable.iter().cloned().collect();
        hex.access = config
            .access
            .as_ref()
            .map(|access| Access::from_config(&owner, access))
            .transpose()?
            .filter(|access| !access.is_empty());
        hex.blocked_for_tile_lays = config.blocked;
        Ok(hex)
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_invalid_side(mut self, side: HexSide) -> Self {
        self.declared_invalid.insert(side);
        self
    }

    pub fn with_impassable_neighbour(mut self, hex: impl Into<String>) -> Self {
        self.impassable_neighbours.insert(hex.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn coord(&self) -> HexCoord {
        self.coord
    }

    pub fn current_tile(&self) -> &Arc<Tile> {
        &self.tile
    }

    pub fn rotation(&self) -> HexSide {
        self.rotation
    }

    pub fn access(&self) -> Option<&Access> {
        self.access.as_ref()
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    pub fn stop(&self, number: u8) -> Option<&Stop> {
        self.stops.get(&number)
    }

    pub fn stop_for_station(&self, station: u8) -> Option<&Stop> {
        self.stops
            .values()
            .find(|stop| stop.related_station_number() == station)
    }

    pub fn invalid_sides(&self) -> HexSides {
        self.invalid_sides
    }

    pub fn impassable_sides(&self) -> HexSides {
        self.impassable_sides
    }

    /// Sides no track may be laid towards.
    pub fn restricted_sides(&self) -> HexSides {
        self.invalid_sides.union(self.impassable_sides)
    }

    pub fn is_blocked_for_tile_lays(&self) -> bool {
        self.blocked_for_tile_lays
    }

    pub fn set_blocked_for_tile_lays(&mut self, blocked: bool) {
        self.blocked_for_tile_lays = blocked;
    }

    pub fn has_token_of(&self, company: &CompanyId) -> bool {
        self.stops.values().any(|stop| stop.has_token_of(company))
    }

    /// Track of the current tile in map orientation.
    pub fn laid_tracks(&self) -> Vec<Track> {
        self.tile
            .tracks()
            .iter()
            .map(|track| track.create_by_rotation(self.rotation))
            .collect()
    }

    fn is_valid_neighbour(&self, side: HexSide) -> bool {
        !self.declared_invalid.contains(side)
    }

    fn declares_impassable(&self, other: &str) -> bool {
        self.impassable_neighbours.contains(other)
    }

    fn invalidate_stops(&mut self) {
        for stop in self.stops.values_mut() {
            stop.invalidate();
        }
    }

    fn init_stops(&mut self, tile_defaults: &AccessDefaults, map_defaults: &AccessDefaults) {
        let cx = AccessContext {
            tile: self.tile.access(),
            hex: self.access.as_ref(),
            tile_defaults,
            map_defaults,
        };
        for stop in self.stops.values_mut() {
            stop.init_stop_parameters(&cx);
        }
    }

    /// Swaps in a new tile. Stops follow `station_map` (old station number to
    /// new): a stop mapped alone keeps its number and tokens, stops mapped
    /// together merge into the lowest number, new stations get fresh numbers.
    fn replace_tile(
        &mut self,
        tile: Arc<Tile>,
        rotation: HexSide,
        station_map: &BTreeMap<u8, u8>,
    ) -> Result<(), MapError> {
        let mut groups: BTreeMap<u8, Vec<Stop>> = BTreeMap::new();
        for stop in self.stops.values() {
            match station_map.get(&stop.related_station_number()) {
                Some(target) if tile.station(*target).is_some() => {
                    groups.entry(*target).or_default().push(stop.clone());
                }
                _ if !stop.tokens().is_empty() => {
                    warn!(
                        target: "rails.map",
                        hex = %self.id,
                        stop = stop.number(),
                        "stop with tokens dropped by tile replacement"
                    );
                }
                _ => {}
            }
        }

        for (target, group) in &groups {
            let tokens: usize = group.iter().map(|stop| stop.tokens().len()).sum();
            let slots = tile.station(*target).map(|s| s.base_slots).unwrap_or(0);
            if tokens > slots {
                return Err(MapError::TokenOverflow {
                    hex: self.id.clone(),
                    tokens,
                    slots,
                });
            }
        }

        let mut stops = BTreeMap::new();
        let mut fresh = Vec::new();
        for station in tile.stations() {
            let mut group = groups.remove(&station.number).unwrap_or_default().into_iter();
            match group.next() {
                Some(mut stop) => {
                    stop.rebind(Arc::clone(station));
                    for other in group {
                        if other.number() < stop.number() {
                            let mut lower = other;
                            lower.rebind(Arc::clone(station));
                            lower.absorb(stop);
                            stop = lower;
                        } else {
                            stop.absorb(other);
                        }
                    }
                    stops.insert(stop.number(), stop);
                }
                None => fresh.push(Arc::clone(station)),
            }
        }
        for station in fresh {
            let number = (1..=u8::MAX)
                .find(|n| !stops.contains_key(n))
                .unwrap_or(u8::MAX);
            stops.insert(number, Stop::new(number, station));
        }

        self.tile = tile;
        self.rotation = rotation;
        self.stops = stops;
        self.invalidate_stops();
        Ok(())
    }
}

/// The game map: hexes, their adjacency and the map-level access defaults.
#[derive(Debug, Clone, Default)]
pub struct MapManager {
    orientation: MapOrientation,
    hexes: BTreeMap<String, MapHex>,
    coords: HashMap<HexCoord, String>,
    neighbours: HashMap<(String, HexSide), String>,
    defaults: AccessDefaults,
}

impl MapManager {
    pub fn new(orientation: MapOrientation, defaults: AccessDefaults) -> Self {
        Self {
            orientation,
            defaults,
            ..Self::default()
        }
    }

    /// Builds every hex, wires adjacency and resolves stop access.
    pub fn from_config(config: &MapConfig, tiles: &mut TileManager) -> Result<Self, ConfigError> {
        let defaults = AccessDefaults::from_config("map defaults", &config.defaults)?;
        let mut map = MapManager::new(config.orientation, defaults);
        for hex_config in &config.hexes {
            let hex = MapHex::from_config(hex_config, tiles)?;
            if !tiles.take(hex.current_tile().id()) {
                return Err(ConfigError::NotEnoughTiles {
                    owner: format!("hex {}", hex.id()),
                    tile: hex.current_tile().id().to_string(),
                });
            }
            map.add_hex(hex)?;
        }
        for hex in map.hexes.values() {
            if let Some(unknown) = hex
                .impassable_neighbours
                .iter()
                .find(|name| !map.hexes.contains_key(*name))
            {
                return Err(ConfigError::UnknownHex {
                    owner: format!("hex {} impassable", hex.id),
                    hex: unknown.clone(),
                });
            }
        }
        map.wire_neighbours();
        map.init_stops(tiles);
        info!(
            target: "rails.config",
            hexes = map.hexes.len(),
            links = map.neighbours.len() / 2,
            orientation = %map.orientation,
            "map built"
        );
        Ok(map)
    }

    pub fn add_hex(&mut self, hex: MapHex) -> Result<(), ConfigError> {
        if self.hexes.contains_key(hex.id()) || self.coords.contains_key(&hex.coord()) {
            return Err(ConfigError::DuplicateHex(hex.id().to_string()));
        }
        self.coords.insert(hex.coord(), hex.id().to_string());
        self.hexes.insert(hex.id().to_string(), hex);
        Ok(())
    }

    /// Records which hexes touch across which side. A side with no
    /// neighbour, or one either hex declares invalid, becomes invalid; a
    /// side either hex declares impassable becomes impassable on both.
    pub fn wire_neighbours(&mut self) {
        let mut neighbours = HashMap::new();
        let mut invalid: HashMap<String, HexSides> = HashMap::new();
        let mut impassable: HashMap<String, HexSides> = HashMap::new();

        for hex in self.hexes.values() {
            for side in HexSide::ALL {
                let there = self.orientation.adjacent_coordinates(hex.coord, side);
                let Some(other) = self.coords.get(&there).and_then(|id| self.hexes.get(id)) else {
                    invalid.entry(hex.id.clone()).or_default().insert(side);
                    continue;
                };
                if hex.declares_impassable(&other.id) || other.declares_impassable(&hex.id) {
                    impassable.entry(hex.id.clone()).or_default().insert(side);
                } else if hex.is_valid_neighbour(side) && other.is_valid_neighbour(side.opposite())
                {
                    neighbours.insert((hex.id.clone(), side), other.id.clone());
                } else {
                    invalid.entry(hex.id.clone()).or_default().insert(side);
                }
            }
        }

        for hex in self.hexes.values_mut() {
            hex.invalid_sides = invalid.get(&hex.id).copied().unwrap_or_default();
            hex.impassable_sides = impassable.get(&hex.id).copied().unwrap_or_default();
        }
        debug!(target: "rails.map", links = neighbours.len(), "neighbours wired");
        self.neighbours = neighbours;
    }

    /// Resolves access for every stop that is not yet initialised.
    pub fn init_stops(&mut self, tiles: &TileManager) {
        let defaults = &self.defaults;
        for hex in self.hexes.values_mut() {
            hex.init_stops(tiles.defaults(), defaults);
        }
    }

    pub fn orientation(&self) -> MapOrientation {
        self.orientation
    }

    pub fn defaults(&self) -> &AccessDefaults {
        &self.defaults
    }

    pub fn hex(&self, id: &str) -> Option<&MapHex> {
        self.hexes.get(id)
    }

    pub fn hex_mut(&mut self, id: &str) -> Option<&mut MapHex> {
        self.hexes.get_mut(id)
    }

    pub fn hex_at(&self, coord: HexCoord) -> Option<&MapHex> {
        self.coords.get(&coord).and_then(|id| self.hexes.get(id))
    }

    pub fn hexes(&self) -> impl Iterator<Item = &MapHex> {
        self.hexes.values()
    }

    pub fn neighbour(&self, hex: &str, side: HexSide) -> Option<&MapHex> {
        self.neighbours
            .get(&(hex.to_string(), side))
            .and_then(|id| self.hexes.get(id))
    }

    /// Lays `tile_id` on `hex_id` at `rotation` (map orientation). The tile
    /// must be a configured upgrade of the current tile that keeps its track
    /// at that rotation, and its new track may not end on an invalid or
    /// impassable side.
    pub fn lay_tile(
        &mut self,
        hex_id: &str,
        tile_id: &str,
        rotation: HexSide,
        tiles: &mut TileManager,
    ) -> Result<(), MapError> {
        let hex = self
            .hexes
            .get(hex_id)
            .ok_or_else(|| MapError::UnknownHex(hex_id.to_string()))?;
        let target = tiles
            .tile(tile_id)
            .cloned()
            .ok_or_else(|| MapError::UnknownTile(tile_id.to_string()))?;
        let current = Arc::clone(hex.current_tile());
        let upgrade = current
            .upgrade_to(tile_id)
            .ok_or_else(|| MapError::NotAnUpgrade {
                hex: hex_id.to_string(),
                current: current.id().to_string(),
                target: tile_id.to_string(),
            })?;

        let relative = rotation.rotate(hex.rotation().negative());
        let wanted: BTreeSet<Track> = target
            .tracks()
            .iter()
            .map(|track| track.create_by_rotation(relative))
            .collect();
        let placement = upgrade
            .placements(&current, &target)
            .into_iter()
            .find(|placement| placement.tracks == wanted)
            .ok_or_else(|| MapError::InvalidRotation {
                hex: hex_id.to_string(),
                tile: tile_id.to_string(),
                rotation,
            })?;
        if !tiles.has_tiles_left(tile_id) {
            return Err(MapError::NoTilesLeft(tile_id.to_string()));
        }
        let closed = placement
            .new_sides()
            .intersection(hex.restricted_sides().rotate(hex.rotation().negative()));
        if !closed.is_empty() {
            return Err(MapError::ClosedEdge {
                hex: hex_id.to_string(),
                tile: tile_id.to_string(),
                rotation,
                sides: closed.rotate(hex.rotation()),
            });
        }

        let defaults = &self.defaults;
        let hex = self
            .hexes
            .get_mut(hex_id)
            .ok_or_else(|| MapError::UnknownHex(hex_id.to_string()))?;
        hex.replace_tile(target, rotation, &placement.station_map)?;
        tiles.take(tile_id);
        tiles.give_back(current.id());
        hex.init_stops(tiles.defaults(), defaults);

        info!(
            target: "rails.map",
            hex = hex_id,
            tile = tile_id,
            replaced = current.id(),
            rotation = %rotation,
            "tile laid"
        );
        Ok(())
    }

    pub fn lay_token(
        &mut self,
        hex_id: &str,
        stop: u8,
        company: &CompanyId,
    ) -> Result<(), MapError> {
        let hex = self
            .hexes
            .get_mut(hex_id)
            .ok_or_else(|| MapError::UnknownHex(hex_id.to_string()))?;
        if hex.has_token_of(company) {
            return Err(MapError::DuplicateToken {
                hex: hex_id.to_string(),
                company: company.clone(),
            });
        }
        let target = hex.stops.get_mut(&stop).ok_or_else(|| MapError::UnknownStop {
            hex: hex_id.to_string(),
            stop,
        })?;
        if !target.add_token(company.clone()) {
            return Err(MapError::StopFull {
                hex: hex_id.to_string(),
                stop,
            });
        }
        info!(target: "rails.map", hex = hex_id, stop, company = %company, "token laid");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Station, TileUpgrade};
    use crate::types::{RunPermission, StopType, TileColour};

    fn tiles() -> TileManager {
        let mut tiles = TileManager::default();
        tiles
            .add_tile(
                Tile::new("0", TileColour::White)
                    .with_upgrade(TileUpgrade::new("9"))
                    .with_upgrade(TileUpgrade::new("9x")),
            )
            .unwrap();
        tiles
            .add_tile(
                Tile::new("9", TileColour::Yellow)
                    .with_quantity(1)
                    .with_track(Track::parse("side0", "side3").unwrap()),
            )
            .unwrap();
        tiles
            .add_tile(
                Tile::new("9x", TileColour::Yellow)
                    .with_track(Track::parse("side1", "side4").unwrap()),
            )
            .unwrap();
        tiles
            .add_tile(
                Tile::new("OO", TileColour::Yellow)
                    .with_station(Station::new(0, StopType::City).with_slots(1).with_value(20))
                    .with_station(Station::new(0, StopType::City).with_slots(1).with_value(20))
                    .with_track(Track::parse("city1", "side0").unwrap())
                    .with_track(Track::parse("city2", "side3").unwrap())
                    .with_upgrade(TileUpgrade::new("M"))
                    .with_upgrade(TileUpgrade::new("M1")),
            )
            .unwrap();
        tiles
            .add_tile(
                Tile::new("M", TileColour::Green)
                    .with_station(Station::new(0, StopType::City).with_slots(2).with_value(40))
                    .with_track(Track::parse("city1", "side0").unwrap())
                    .with_track(Track::parse("city1", "side3").unwrap()),
            )
            .unwrap();
        tiles
            .add_tile(
                Tile::new("M1", TileColour::Green)
                    .with_station(Station::new(0, StopType::City).with_slots(1).with_value(40))
                    .with_track(Track::parse("city1", "side0").unwrap())
                    .with_track(Track::parse("city1", "side3").unwrap()),
            )
            .unwrap();
        tiles
    }

    fn map(tiles: &TileManager) -> MapManager {
        let mut map = MapManager::new(MapOrientation::NS, AccessDefaults::new());
        let blank = tiles.tile("0").unwrap();
        for name in ["A2", "C2", "B3", "E2"] {
            map.add_hex(MapHex::new(name, Arc::clone(blank), HexSide::get(0)).unwrap())
                .unwrap();
        }
        map.add_hex(
            MapHex::new("B1", Arc::clone(blank), HexSide::get(0))
                .unwrap()
                .with_impassable_neighbour("C2"),
        )
        .unwrap();
        map.add_hex(
            MapHex::new("D1", Arc::clone(blank), HexSide::get(0))
                .unwrap()
                .with_invalid_side(HexSide::get(4)),
        )
        .unwrap();
        map.wire_neighbours();
        map.init_stops(tiles);
        map
    }

    #[test]
    fn adjacency_is_symmetric() {
        let tiles = tiles();
        let map = map(&tiles);
        // C2 side 3 (north) is A2, side 4 (north-east) is B3
        assert_eq!(map.neighbour("C2", HexSide::get(3)).unwrap().id(), "A2");
        assert_eq!(map.neighbour("A2", HexSide::get(0)).unwrap().id(), "C2");
        assert_eq!(map.neighbour("C2", HexSide::get(4)).unwrap().id(), "B3");
        assert_eq!(map.neighbour("B3", HexSide::get(1)).unwrap().id(), "C2");
        assert_eq!(map.neighbour("C2", HexSide::get(0)).unwrap().id(), "E2");
        for hex in map.hexes() {
            for side in HexSide::ALL {
                if let Some(other) = map.neighbour(hex.id(), side) {
                    assert_eq!(map.neighbour(other.id(), side.opposite()).unwrap().id(), hex.id());
                }
            }
        }
    }

    #[test]
    fn map_edges_are_invalid() {
        let tiles = tiles();
        let map = map(&tiles);
        let a2 = map.hex("A2").unwrap();
        assert!(a2.invalid_sides().contains(HexSide::get(3)));
        assert!(!a2.invalid_sides().contains(HexSide::get(0)));
    }

    #[test]
    fn declared_invalid_side_blocks_both_hexes() {
        let tiles = tiles();
        let map = map(&tiles);
        // D1 side 4 faces C2 side 1
        assert!(map.neighbour("D1", HexSide::get(4)).is_none());
        assert!(map.neighbour("C2", HexSide::get(1)).is_none());
        assert!(map.hex("C2").unwrap().invalid_sides().contains(HexSide::get(1)));
        assert!(!map.hex("C2").unwrap().impassable_sides().contains(HexSide::get(1)));
    }

    #[test]
    fn impassable_is_recorded_on_both_sides() {
        let tiles = tiles();
        let map = map(&tiles);
        // B1 side 5 (south-east) faces C2 side 2 (north-west)
        assert!(map.neighbour("B1", HexSide::get(5)).is_none());
        assert!(map.hex("B1").unwrap().impassable_sides().contains(HexSide::get(5)));
        assert!(map.hex("C2").unwrap().impassable_sides().contains(HexSide::get(2)));
        assert!(map.hex("C2").unwrap().restricted_sides().contains(HexSide::get(2)));
    }

    #[test]
    fn lay_tile_consumes_stock_and_checks_rotation() {
        let mut tiles = tiles();
        let mut map = map(&tiles);

        let err = map.lay_tile("C2", "OO", HexSide::get(0), &mut tiles).unwrap_err();
        assert!(matches!(err, MapError::NotAnUpgrade { .. }));

        map.lay_tile("C2", "9", HexSide::get(3), &mut tiles).unwrap();
        let c2 = map.hex("C2").unwrap();
        assert_eq!(c2.current_tile().id(), "9");
        assert_eq!(c2.rotation(), HexSide::get(3));
        assert_eq!(tiles.remaining("9"), Some(0));
        assert_eq!(
            c2.laid_tracks(),
            vec![Track::parse("side0", "side3").unwrap()]
        );

        let err = map.lay_tile("A2", "9", HexSide::get(0), &mut tiles).unwrap_err();
        assert!(matches!(err, MapError::NoTilesLeft(_)));
    }

    #[test]
    fn lay_tile_refuses_track_across_closed_edges() {
        let mut tiles = tiles();
        let mut map = map(&tiles);

        // side 1 faces D1, which declares the edge invalid
        let err = map.lay_tile("C2", "9x", HexSide::get(0), &mut tiles).unwrap_err();
        assert!(matches!(
            err,
            MapError::ClosedEdge { ref sides, .. } if *sides == HexSides::EMPTY.with(HexSide::get(1))
        ));
        // side 2 faces B1 across an impassable edge
        let err = map.lay_tile("C2", "9", HexSide::get(2), &mut tiles).unwrap_err();
        assert!(matches!(err, MapError::ClosedEdge { .. }));

        let c2 = map.hex("C2").unwrap();
        assert_eq!(c2.current_tile().id(), "0");
        assert_eq!(tiles.remaining("9"), Some(1));
    }

    #[test]
    fn merging_cities_keeps_lowest_number_and_all_tokens() {
        let mut tiles = tiles();
        let mut map = MapManager::new(MapOrientation::NS, AccessDefaults::new());
        let oo = Arc::clone(tiles.tile("OO").unwrap());
        map.add_hex(
            MapHex::new("C2", oo, HexSide::get(0)).unwrap().with_access(Access {
                run_through: Some(RunPermission::TokenOnly),
                ..Access::default()
            }),
        )
        .unwrap();
        map.wire_neighbours();
        map.init_stops(&tiles);

        let prr = CompanyId::new("PRR");
        let nyc = CompanyId::new("NYC");
        map.lay_token("C2", 2, &prr).unwrap();
        assert!(matches!(
            map.lay_token("C2", 1, &prr),
            Err(MapError::DuplicateToken { .. })
        ));
        map.lay_token("C2", 1, &nyc).unwrap();

        map.lay_tile("C2", "M", HexSide::get(0), &mut tiles).unwrap();
        let c2 = map.hex("C2").unwrap();
        let stops: Vec<&Stop> = c2.stops().collect();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].number(), 1);
        assert_eq!(stops[0].tokens().len(), 2);
        assert!(stops[0].is_initialized());
        assert_eq!(stops[0].run_through_allowed(), RunPermission::TokenOnly);
        assert_eq!(stops[0].value(), 40);
    }

    #[test]
    fn merge_that_overflows_is_refused() {
        let mut tiles = tiles();
        let mut map = MapManager::new(MapOrientation::NS, AccessDefaults::new());
        let oo = Arc::clone(tiles.tile("OO").unwrap());
        map.add_hex(MapHex::new("C2", oo, HexSide::get(0)).unwrap()).unwrap();
        map.wire_neighbours();
        map.init_stops(&tiles);
        map.lay_token("C2", 1, &CompanyId::new("PRR")).unwrap();
        map.lay_token("C2", 2, &CompanyId::new("NYC")).unwrap();

        let err = map.lay_tile("C2", "M1", HexSide::get(0), &mut tiles).unwrap_err();
        assert!(matches!(err, MapError::TokenOverflow { tokens: 2, slots: 1, .. }));
        let c2 = map.hex("C2").unwrap();
        assert_eq!(c2.current_tile().id(), "OO");
        assert_eq!(c2.stops().count(), 2);
    }

    #[test]
    fn full_stop_refuses_tokens() {
        let tiles = tiles();
        let mut map = MapManager::new(MapOrientation::EW, AccessDefaults::new());
        let oo = Arc::clone(tiles.tile("OO").unwrap());
        map.add_hex(MapHex::new("C2", oo, HexSide::get(0)).unwrap()).unwrap();
        map.lay_token("C2", 1, &CompanyId::new("PRR")).unwrap();
        assert!(matches!(
            map.lay_token("C2", 1, &CompanyId::new("NYC")),
            Err(MapError::StopFull { stop: 1, .. })
        ));
        assert!(matches!(
            map.lay_token("C2", 7, &CompanyId::new("NYC")),
            Err(MapError::UnknownStop { stop: 7, .. })
        ));
    }
}
