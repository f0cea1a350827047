use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coords::MapOrientation;
use crate::types::RouteAlgorithm;

/// Fatal problems found while loading game configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{owner}: invalid value '{value}' for {field}")]
    InvalidValue {
        owner: String,
        field: &'static str,
        value: String,
    },
    #[error("{owner}: missing required attribute {attribute}")]
    MissingAttribute {
        owner: String,
        attribute: &'static str,
    },
    #[error("malformed track endpoint '{0}', expected sideN or cityN")]
    MalformedTrackPoint(String),
    #[error("invalid hex name '{0}'")]
    InvalidHexName(String),
    #[error("duplicate tile id {0}")]
    DuplicateTile(String),
    #[error("duplicate hex {0}")]
    DuplicateHex(String),
    #[error("{owner}: unknown tile {tile}")]
    UnknownTile { owner: String, tile: String },
    #[error("{owner}: unknown hex {hex}")]
    UnknownHex { owner: String, hex: String },
    #[error("{owner}: track refers to missing station {station}")]
    UnknownStation { owner: String, station: u8 },
    #[error("{owner}: invalid side {side}")]
    InvalidSide { owner: String, side: i32 },
    #[error("{owner}: not enough copies of tile {tile}")]
    NotEnoughTiles { owner: String, tile: String },
    #[error("tile {tile}: {count} stations, at most 255 are supported")]
    TooManyStations { tile: String, count: usize },
    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw access overrides. Values stay strings here so that bad entries can be
/// reported against their owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    #[serde(rename = "type", default)]
    pub stop_type: Option<String>,
    #[serde(default)]
    pub run_to: Option<String>,
    #[serde(default)]
    pub run_through: Option<String>,
    #[serde(default)]
    pub score: Option<String>,
    #[serde(default)]
    pub mutex_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub stop_type: String,
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub slots: usize,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub access: Option<AccessConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackConfig {
    pub from: String,
    pub to: String,
}

/// One upgrade rule: the listed tiles may replace the owning tile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeConfig {
    pub tiles: Vec<String>,
    /// Empty means every hex.
    #[serde(default)]
    pub hexes: Vec<String>,
    #[serde(default)]
    pub excluded_hexes: Vec<String>,
    /// Empty means every phase.
    #[serde(default)]
    pub phases: Vec<String>,
    #[serde(default)]
    pub station_map: BTreeMap<u8, u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub colour: String,
    /// Absent means unlimited.
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub stations: Vec<StationConfig>,
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
    #[serde(default)]
    pub access: Option<AccessConfig>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TileSetConfig {
    #[serde(default)]
    pub defaults: Vec<AccessConfig>,
    #[serde(default)]
    pub tiles: Vec<TileConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HexConfig {
    pub name: String,
    pub tile: String,
    #[serde(default)]
    pub rotation: i32,
    #[serde(default)]
    pub invalid_sides: Vec<i32>,
    /// Names of neighbouring hexes that track may never cross to.
    #[serde(default)]
    pub impassable: Vec<String>,
    #[serde(default)]
    pub access: Option<AccessConfig>,
    #[serde(default)]
    pub blocked: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub orientation: MapOrientation,
    #[serde(default)]
    pub defaults: Vec<AccessConfig>,
    #[serde(default)]
    pub hexes: Vec<HexConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseConfig {
    pub name: String,
    pub tile_colours: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyConfig {
    pub id: String,
    #[serde(default)]
    pub home_hexes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    #[serde(default)]
    pub route_algorithm: RouteAlgorithm,
    #[serde(default)]
    pub tiles: TileSetConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
    #[serde(default)]
    pub companies: Vec<CompanyConfig>,
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        info!(
            target: "rails.config",
            tiles = config.tiles.tiles.len(),
            hexes = config.map.hexes.len(),
            algorithm = %config.route_algorithm,
            "configuration parsed"
        );
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
