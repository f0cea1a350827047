use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::board::MapHex;
use crate::coords::{HexSide, HexSides};
use crate::game::{LayTile, Phase};
use crate::tile::{Placement, Tile, TileManager, TileUpgrade};
use crate::types::{RouteAlgorithm, TileColour};
use crate::upgrade::Validation;

/// A candidate tile lay: one configured upgrade of the tile on one hex.
///
/// Rotations are computed on demand by [`TileHexUpgrade::find_valid_rotations`]
/// and reported in map orientation, i.e. as the rotation the new tile would
/// be laid at.
#[derive(Debug, Clone)]
pub struct TileHexUpgrade {
    hex: String,
    hex_rotation: HexSide,
    blocked: bool,
    base: Arc<Tile>,
    target: Arc<Tile>,
    upgrade: TileUpgrade,
    action: LayTile,
    rotations: Option<HexSides>,
    permissive_route_possible: bool,
    validations: Option<BTreeSet<Validation>>,
    visible: bool,
}

impl TileHexUpgrade {
    pub fn new(hex: &MapHex, target: Arc<Tile>, upgrade: TileUpgrade, action: LayTile) -> Self {
        Self {
            hex: hex.id().to_string(),
            hex_rotation: hex.rotation(),
            blocked: hex.is_blocked_for_tile_lays(),
            base: Arc::clone(hex.current_tile()),
            target,
            upgrade,
            action,
            rotations: None,
            permissive_route_possible: false,
            validations: None,
            visible: true,
        }
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn base(&self) -> &Arc<Tile> {
        &self.base
    }

    pub fn target(&self) -> &Arc<Tile> {
        &self.target
    }

    pub fn upgrade(&self) -> &TileUpgrade {
        &self.upgrade
    }

    pub fn action(&self) -> &LayTile {
        &self.action
    }

    /// `None` until [`TileHexUpgrade::find_valid_rotations`] has run.
    pub fn rotations(&self) -> Option<HexSides> {
        self.rotations
    }

    pub fn permissive_route_possible(&self) -> bool {
        self.permissive_route_possible
    }

    pub fn validations(&self) -> Option<&BTreeSet<Validation>> {
        self.validations.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// A yellow tile on the company's own home hex, or a special property lay
    /// on one of its listed hexes that waives the connection, needs no route.
    pub fn requires_connection(&self) -> bool {
        if self.target.colour() == TileColour::Yellow && self.action.company.is_home_hex(&self.hex)
        {
            return false;
        }
        match self.action.special_property_for(&self.hex) {
            Some(special) => special.connected,
            None => true,
        }
    }

    /// Computes the legal rotations. `connected` and `invalid` are sides of
    /// the hex in map orientation.
    pub fn find_valid_rotations(
        &mut self,
        connected: HexSides,
        invalid: HexSides,
        algorithm: RouteAlgorithm,
    ) -> HexSides {
        // placements are relative to the laid tile, so work in its frame
        let back = self.hex_rotation.negative();
        let connected = connected.rotate(back);
        let invalid = invalid.rotate(back);
        let placements = self.upgrade.placements(&self.base, &self.target);

        let avoids_invalid = |placement: &Placement, all_track: bool| {
            let sides = if all_track {
                placement.sides()
            } else {
                placement.new_sides()
            };
            !sides.intersects(invalid)
        };
        let touches = |placement: &Placement| placement.sides().intersects(connected);

        let relative: HexSides = if self.requires_connection() {
            let permissive: HexSides = placements
                .iter()
                .filter(|&p| avoids_invalid(p, false) && touches(p))
                .map(|p| p.rotation)
                .collect();
            self.permissive_route_possible = !permissive.is_empty();
            if algorithm.is_strict() {
                let through_stations = algorithm == RouteAlgorithm::SemiRestrictive;
                placements
                    .iter()
                    .filter(|&p| avoids_invalid(p, true))
                    .filter(|&p| {
                        if p.new_tracks.is_empty() {
                            touches(p)
                        } else {
                            p.reaches_new_track(connected, through_stations)
                        }
                    })
                    .map(|p| p.rotation)
                    .collect()
            } else {
                permissive
            }
        } else {
            self.permissive_route_possible = false;
            placements
                .iter()
                .filter(|&p| avoids_invalid(p, algorithm.is_strict()))
                .map(|p| p.rotation)
                .collect()
        };

        let rotations = relative.rotate(self.hex_rotation);
        debug!(
            target: "rails.upgrade",
            hex = %self.hex,
            tile = self.target.id(),
            %algorithm,
            %rotations,
            permissive = self.permissive_route_possible,
            "rotations computed"
        );
        self.rotations = Some(rotations);
        rotations
    }

    /// Collects every reason the lay is not possible in `phase`.
    pub fn validate(&mut self, phase: &Phase, tiles: &TileManager) -> &BTreeSet<Validation> {
        let mut reasons = BTreeSet::new();
        if self.blocked && self.action.special_property_for(&self.hex).is_none() {
            reasons.insert(Validation::HexBlocked);
        }
        if !tiles.has_tiles_left(self.target.id()) {
            reasons.insert(Validation::NoTilesLeft);
        }
        if !self.upgrade.is_allowed_for_hex(&self.hex) {
            reasons.insert(Validation::NotAllowedForHex);
        }
        if !self.upgrade.is_allowed_for_phase(&phase.name) {
            reasons.insert(Validation::NotAllowedForPhase);
        }
        if !phase.is_tile_colour_allowed(self.target.colour()) {
            reasons.insert(Validation::ColourNotAllowed);
        }
        if self.no_route_to_new_track() {
            reasons.insert(Validation::NoRouteToNewTrack);
        } else if self.no_valid_rotation() {
            reasons.insert(Validation::NoValidOrientation);
        }
        self.validations.insert(reasons)
    }

    /// Valid until validation has found a reason otherwise.
    pub fn is_valid(&self) -> bool {
        self.validations.as_ref().is_none_or(BTreeSet::is_empty)
    }

    pub fn no_valid_rotation(&self) -> bool {
        self.rotations.is_some_and(HexSides::is_empty)
    }

    /// Some rotation would touch the network, but none continues it.
    pub fn no_route_to_new_track(&self) -> bool {
        self.no_valid_rotation() && self.permissive_route_possible
    }

    pub fn compare(&self, other: &TileHexUpgrade) -> Ordering {
        self.target.natural_cmp(&other.target)
    }
}
