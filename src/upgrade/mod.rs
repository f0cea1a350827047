//! Candidate map changes offered to a company: tile lays and token lays,
//! each with its reasons for being impossible and a stable presentation
//! order.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::board::{MapError, MapManager};
use crate::coords::HexSides;
use crate::game::{LayTile, LayToken, Phase};
use crate::tile::TileManager;
use crate::types::RouteAlgorithm;

mod tile_hex;
mod token_stop;

pub use tile_hex::TileHexUpgrade;
pub use token_stop::TokenStopUpgrade;

/// Why a tile lay is not possible. The names double as message keys.
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
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Validation {
    NoValidOrientation,
    HexBlocked,
    NoTilesLeft,
    NotAllowedForHex,
    NotAllowedForPhase,
    ColourNotAllowed,
    NoRouteToNewTrack,
}

#[derive(Debug, Clone)]
pub enum MapUpgrade {
    Tile(TileHexUpgrade),
    Token(TokenStopUpgrade),
}

impl MapUpgrade {
    /// Coarse sort bucket, lower first.
    pub fn compare_id(&self) -> u8 {
        match self {
            MapUpgrade::Token(_) => 0,
            MapUpgrade::Tile(_) => 1,
        }
    }

    pub fn hex(&self) -> &str {
        match self {
            MapUpgrade::Tile(upgrade) => upgrade.hex(),
            MapUpgrade::Token(upgrade) => upgrade.hex(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            MapUpgrade::Tile(upgrade) => upgrade.is_valid(),
            MapUpgrade::Token(upgrade) => upgrade.is_valid(),
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            MapUpgrade::Tile(upgrade) => upgrade.is_visible(),
            MapUpgrade::Token(upgrade) => upgrade.is_visible(),
        }
    }

    /// Bucket, then valid before invalid, then the variant's own order.
    pub fn compare(&self, other: &MapUpgrade) -> Ordering {
        self.compare_id()
            .cmp(&other.compare_id())
            .then_with(|| other.is_valid().cmp(&self.is_valid()))
            .then_with(|| match (self, other) {
                (MapUpgrade::Tile(a), MapUpgrade::Tile(b)) => a.compare(b),
                (MapUpgrade::Token(a), MapUpgrade::Token(b)) => a.compare(b),
                _ => Ordering::Equal,
            })
    }
}

pub fn sort_upgrades(upgrades: &mut [MapUpgrade]) {
    upgrades.sort_by(MapUpgrade::compare);
}

/// Every configured upgrade of the tile on `hex_id` that `action` may lay,
/// with rotations and validation computed, sorted.
///
/// `connected` holds the sides of the hex (map orientation) that the acting
/// company's network reaches.
pub fn tile_upgrades(
    map: &MapManager,
    tiles: &TileManager,
    hex_id: &str,
    action: &LayTile,
    phase: &Phase,
    connected: HexSides,
    algorithm: RouteAlgorithm,
) -> Result<Vec<MapUpgrade>, MapError> {
    let hex = map
        .hex(hex_id)
        .ok_or_else(|| MapError::UnknownHex(hex_id.to_string()))?;
    let invalid = hex.restricted_sides();

    let mut upgrades = Vec::new();
    for upgrade in hex.current_tile().upgrades() {
        if !action.permits_tile(&upgrade.target) {
            continue;
        }
        let target = tiles
            .tile(&upgrade.target)
            .ok_or_else(|| MapError::UnknownTile(upgrade.target.clone()))?;
        let mut candidate =
            TileHexUpgrade::new(hex, Arc::clone(target), upgrade.clone(), action.clone());
        candidate.find_valid_rotations(connected, invalid, algorithm);
        candidate.validate(phase, tiles);
        candidate.set_visible(upgrade.is_allowed_for_hex(hex_id));
        upgrades.push(MapUpgrade::Tile(candidate));
    }
    sort_upgrades(&mut upgrades);

    debug!(
        target: "rails.upgrade",
        hex = hex_id,
        company = %action.company.id,
        candidates = upgrades.len(),
        valid = upgrades.iter().filter(|u| u.is_valid()).count(),
        "tile upgrades listed"
    );
    Ok(upgrades)
}

/// One candidate per stop on `hex_id` that can still take the company's
/// token, sorted. Empty when the company already has a token there.
pub fn token_upgrades(
    map: &MapManager,
    hex_id: &str,
    action: &LayToken,
) -> Result<Vec<MapUpgrade>, MapError> {
    let hex = map
        .hex(hex_id)
        .ok_or_else(|| MapError::UnknownHex(hex_id.to_string()))?;
    if hex.has_token_of(&action.company.id) {
        return Ok(Vec::new());
    }
    let mut upgrades: Vec<MapUpgrade> = hex
        .stops()
        .filter(|stop| stop.has_free_slot())
        .map(|stop| MapUpgrade::Token(TokenStopUpgrade::new(hex_id, stop, action.clone())))
        .collect();
    sort_upgrades(&mut upgrades);

    debug!(
        target: "rails.upgrade",
        hex = hex_id,
        company = %action.company.id,
        candidates = upgrades.len(),
        "token upgrades listed"
    );
    Ok(upgrades)
}
