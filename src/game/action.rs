use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::game::company::Company;
use crate::tile::TileId;

/// A private-company power that lets a company lay a tile outside the
/// normal rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTileLay {
    pub name: String,
    pub locations: BTreeSet<String>,
    /// Restricts the lay to these tiles when non-empty.
    pub tiles: BTreeSet<TileId>,
    /// Whether the lay still has to connect to the company's network.
    pub connected: bool,
}

impl SpecialTileLay {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locations: BTreeSet::new(),
            tiles: BTreeSet::new(),
            connected: true,
        }
    }

    pub fn at(mut self, hex: impl Into<String>) -> Self {
        self.locations.insert(hex.into());
        self
    }

    pub fn with_tile(mut self, tile: impl Into<TileId>) -> Self {
        self.tiles.insert(tile.into());
        self
    }

    pub fn unconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn covers(&self, hex: &str) -> bool {
        self.locations.contains(hex)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayTile {
    pub company: Company,
    /// Fixed candidate tiles; empty means any configured upgrade.
    pub tiles: BTreeSet<TileId>,
    pub special_property: Option<SpecialTileLay>,
}

impl LayTile {
    pub fn new(company: Company) -> Self {
        Self {
            company,
            tiles: BTreeSet::new(),
            special_property: None,
        }
    }

    pub fn with_tiles<I, S>(mut self, tiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TileId>,
    {
        self.tiles = tiles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_special_property(mut self, special: SpecialTileLay) -> Self {
        self.special_property = Some(special);
        self
    }

    /// The special property, if it applies to `hex`.
    pub fn special_property_for(&self, hex: &str) -> Option<&SpecialTileLay> {
        self.special_property
            .as_ref()
            .filter(|special| special.covers(hex))
    }

    pub fn permits_tile(&self, tile: &str) -> bool {
        let fixed = self.tiles.is_empty() || self.tiles.contains(tile);
        let special = self
            .special_property
            .as_ref()
            .map(|special| special.tiles.is_empty() || special.tiles.contains(tile))
            .unwrap_or(true);
        fixed && special
    }
}

/// Subtypes of a base token lay; higher values are more specific.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BaseTokenLayType {
    Generic = 0,
    LocationSpecific = 1,
    SpecialProperty = 2,
    HomeCity = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenLayKind {
    Base(BaseTokenLayType),
    Bonus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayToken {
    pub company: Company,
    pub kind: TokenLayKind,
}

impl LayToken {
    pub fn base(company: Company, lay_type: BaseTokenLayType) -> Self {
        Self {
            company,
            kind: TokenLayKind::Base(lay_type),
        }
    }

    pub fn bonus(company: Company) -> Self {
        Self {
            company,
            kind: TokenLayKind::Bonus,
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self.kind, TokenLayKind::Base(_))
    }

    pub fn base_type(&self) -> Option<BaseTokenLayType> {
        match self.kind {
            TokenLayKind::Base(lay_type) => Some(lay_type),
            TokenLayKind::Bonus => None,
        }
    }
}
