use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::access::{Access, AccessDefaults};
use crate::config::{ConfigError, StationConfig, TileConfig, TileSetConfig};
use crate::coords::HexSides;
use crate::track::{Track, TrackPoint};
use crate::types::{StopType, TileColour};

mod upgrade;

pub use upgrade::{Placement, TileUpgrade};

pub type TileId = String;

/// A junction drawn on a tile design. Shared by every hex showing the tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub id: String,
    /// 1-based, as used by `cityN` track endpoints.
    pub number: u8,
    pub stop_type: StopType,
    pub value: i32,
    pub base_slots: usize,
    pub position: i32,
    pub access: Option<Access>,
}

impl Station {
    pub fn new(number: u8, stop_type: StopType) -> Self {
        Self {
            id: format!("city{number}"),
            number,
            stop_type,
            value: 0,
            base_slots: 0,
            position: 0,
            access: None,
        }
    }

    pub fn with_value(mut self, value: i32) -> Self {
        self.value = value;
        self
    }

    pub fn with_slots(mut self, slots: usize) -> Self {
        self.base_slots = slots;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    fn from_config(tile: &str, number: u8, config: &StationConfig) -> Result<Self, ConfigError> {
        let owner = format!("tile {tile} station {}", config.id);
        let stop_type =
            StopType::from_str(config.stop_type.trim()).map_err(|_| ConfigError::InvalidValue {
                owner: owner.clone(),
                field: "type",
                value: config.stop_type.clone(),
            })?;
        let access = config
            .access
            .as_ref()
            .map(|access| Access::from_config(&owner, access))
            .transpose()?
            .filter(|access| !access.is_empty());
        Ok(Self {
            id: config.id.clone(),
            number,
            stop_type,
            value: config.value,
            base_slots: config.slots,
            position: config.position,
            access,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    id: TileId,
    name: String,
    colour: TileColour,
    stations: Vec<Arc<Station>>,
    tracks: BTreeSet<Track>,
    access: Option<Access>,
    quantity: Option<u32>,
    upgrades: Vec<TileUpgrade>,
}

impl Tile {
    pub fn new(id: impl Into<TileId>, colour: TileColour) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            colour,
            stations: Vec::new(),
            tracks: BTreeSet::new(),
            access: None,
            quantity: None,
            upgrades: Vec::new(),
        }
    }

    /// Adds the next station; its number is its 1-based position. Stations
    /// past the 255th all share number 255; loading from configuration
    /// rejects such tiles.
    pub fn with_station(mut self, station: Station) -> Self {
        let number = u8::try_from(self.stations.len() + 1).unwrap_or(u8::MAX);
        self.stations.push(Arc::new(Station { number, ..station }));
        self
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.insert(track);
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_upgrade(mut self, upgrade: TileUpgrade) -> Self {
        self.upgrades.push(upgrade);
        self
    }

    pub fn from_config(config: &TileConfig) -> Result<Self, ConfigError> {
        let owner = format!("tile {}", config.id);
        let colour =
            TileColour::from_str(config.colour.trim()).map_err(|_| ConfigError::InvalidValue {
                owner: owner.clone(),
                field: "colour",
                value: config.colour.clone(),
            })?;

        let stations = config
            .stations
            .iter()
            .enumerate()
            .map(|(idx, station)| {
                let number = u8::try_from(idx + 1).map_err(|_| ConfigError::TooManyStations {
                    tile: config.id.clone(),
                    count: config.stations.len(),
                })?;
                Station::from_config(&config.id, number, station).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut tracks = BTreeSet::new();
        for track in &config.tracks {
            let track = Track::parse(&track.from, &track.to)?;
            for point in track.points() {
                if let TrackPoint::Station(number) = point {
                    if number as usize > stations.len() {
                        return Err(ConfigError::UnknownStation {
                            owner: owner.clone(),
                            station: number,
                        });
                    }
                }
            }
            tracks.insert(track);
        }

        let access = config
            .access
            .as_ref()
            .map(|access| Access::from_config(&owner, access))
            .transpose()?
            .filter(|access| !access.is_empty());

        let upgrades = config
            .upgrades
            .iter()
            .flat_map(|upgrade| {
                upgrade
                    .tiles
                    .iter()
                    .map(move |target| TileUpgrade::from_config(target.trim(), upgrade))
            })
            .collect();

        Ok(Self {
            id: config.id.clone(),
            name: config.name.clone().unwrap_or_else(|| config.id.clone()),
            colour,
            stations,
            tracks,
            access,
            quantity: config.quantity,
            upgrades,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colour(&self) -> TileColour {
        self.colour
    }

    pub fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }

    pub fn station(&self, number: u8) -> Option<&Arc<Station>> {
        self.stations.iter().find(|station| station.number == number)
    }

    pub fn tracks(&self) -> &BTreeSet<Track> {
        &self.tracks
    }

    pub fn track_sides(&self) -> HexSides {
        self.tracks
            .iter()
            .fold(HexSides::EMPTY, |acc, track| acc.union(track.sides()))
    }

    pub fn access(&self) -> Option<&Access> {
        self.access.as_ref()
    }

    pub fn quantity(&self) -> Option<u32> {
        self.quantity
    }

    pub fn upgrades(&self) -> &[TileUpgrade] {
        &self.upgrades
    }

    pub fn upgrade_to(&self, target: &str) -> Option<&TileUpgrade> {
        self.upgrades.iter().find(|upgrade| upgrade.target == target)
    }

    /// Colour first, then the number in the id, then the id itself.
    pub fn natural_cmp(&self, other: &Tile) -> Ordering {
        self.colour
            .cmp(&other.colour)
            .then_with(|| tile_number(&self.id).cmp(&tile_number(&other.id)))
            .then_with(|| self.id.cmp(&other.id))
    }
}

fn tile_number(id: &str) -> Option<i64> {
    let digits: String = id.chars().filter(char::is_ascii_digit).collect();
    let number = digits.parse::<i64>().ok()?;
    Some(if id.starts_with('-') { -number } else { number })
}

/// The tile set of a game: designs, remaining stock and the tile-level
/// default access rules.
#[derive(Debug, Clone, Default)]
pub struct TileManager {
    tiles: BTreeMap<TileId, Arc<Tile>>,
    defaults: AccessDefaults,
    laid: HashMap<TileId, u32>,
}

impl TileManager {
    pub fn new(defaults: AccessDefaults) -> Self {
        Self {
            tiles: BTreeMap::new(),
            defaults,
            laid: HashMap::new(),
        }
    }

    pub fn from_config(config: &TileSetConfig) -> Result<Self, ConfigError> {
        let defaults = AccessDefaults::from_config("tile manager defaults", &config.defaults)?;
        let mut manager = TileManager::new(defaults);
        for tile in &config.tiles {
            manager.add_tile(Tile::from_config(tile)?)?;
        }
        manager.check_upgrade_targets()?;
        info!(target: "rails.config", tiles = manager.tiles.len(), "tile set loaded");
        Ok(manager)
    }

    pub fn add_tile(&mut self, tile: Tile) -> Result<(), ConfigError> {
        if self.tiles.contains_key(tile.id()) {
            return Err(ConfigError::DuplicateTile(tile.id().to_string()));
        }
        self.tiles.insert(tile.id().to_string(), Arc::new(tile));
        Ok(())
    }

    pub fn check_upgrade_targets(&self) -> Result<(), ConfigError> {
        for tile in self.tiles.values() {
            for upgrade in tile.upgrades() {
                if !self.tiles.contains_key(&upgrade.target) {
                    return Err(ConfigError::UnknownTile {
                        owner: format!("tile {} upgrade", tile.id()),
                        tile: upgrade.target.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn tile(&self, id: &str) -> Option<&Arc<Tile>> {
        self.tiles.get(id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Arc<Tile>> {
        self.tiles.values()
    }

    pub fn defaults(&self) -> &AccessDefaults {
        &self.defaults
    }

    /// `None` for tiles without a limited quantity.
    pub fn remaining(&self, id: &str) -> Option<u32> {
        let quantity = self.tiles.get(id)?.quantity()?;
        let laid = self.laid.get(id).copied().unwrap_or(0);
        Some(quantity.saturating_sub(laid))
    }

    pub fn has_tiles_left(&self, id: &str) -> bool {
        self.remaining(id) != Some(0)
    }

    /// Takes one copy from stock; `false` if none are left.
    pub(crate) fn take(&mut self, id: &str) -> bool {
        if !self.has_tiles_left(id) {
            return false;
        }
        *self.laid.entry(id.to_string()).or_default() += 1;
        true
    }

    pub(crate) fn give_back(&mut self, id: &str) {
        if let Some(count) = self.laid.get_mut(id) {
            *count = count.saturating_sub(1);
        }
    }
}
