#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod access;
pub mod board;
pub mod cli;
pub mod config;
pub mod coords;
pub mod game;
pub mod route;
pub mod tile;
pub mod track;
pub mod types;
pub mod upgrade;

pub use access::{Access, AccessDefaults};
pub use board::{MapError, MapHex, MapManager, Stop};
pub use config::{ConfigError, GameConfig};
pub use coords::{HexCoord, HexSide, HexSides, MapOrientation};
pub use game::{Company, CompanyId, GameSetup, LayTile, LayToken, Phase};
pub use tile::{Station, Tile, TileManager, TileUpgrade};
pub use track::{Track, TrackPoint};
pub use types::{RouteAlgorithm, RunPermission, ScoreType, StopType, TileColour};
pub use upgrade::{MapUpgrade, TileHexUpgrade, TokenStopUpgrade, Validation};
