use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::board::MapManager;
use crate::config::{ConfigError, GameConfig};
use crate::tile::TileManager;
use crate::types::RouteAlgorithm;

pub mod action;
pub mod company;
pub mod phase;

pub use action::{BaseTokenLayType, LayTile, LayToken, SpecialTileLay, TokenLayKind};
pub use company::{Company, CompanyId};
pub use phase::Phase;

/// Everything the map rules need from a loaded game: tile set, map,
/// phases, companies and the connectivity rule.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub route_algorithm: RouteAlgorithm,
    pub tiles: TileManager,
    pub map: MapManager,
    pub phases: Vec<Phase>,
    pub companies: BTreeMap<CompanyId, Company>,
}

impl GameSetup {
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let mut tiles = TileManager::from_config(&config.tiles)?;
        let map = MapManager::from_config(&config.map, &mut tiles)?;
        let phases = config
            .phases
            .iter()
            .map(Phase::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        let mut companies = BTreeMap::new();
        for company in config.companies.iter().map(Company::from_config) {
            if let Some(home) = company.home_hexes.iter().find(|hex| map.hex(hex).is_none()) {
                return Err(ConfigError::UnknownHex {
                    owner: format!("company {}", company.id),
                    hex: home.clone(),
                });
            }
            companies.insert(company.id.clone(), company);
        }

        info!(
            target: "rails.config",
            phases = phases.len(),
            companies = companies.len(),
            algorithm = %config.route_algorithm,
            "game set up"
        );
        Ok(Self {
            route_algorithm: config.route_algorithm,
            tiles,
            map,
            phases,
            companies,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_config(&GameConfig::from_path(path)?)
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.name == name)
    }

    pub fn company(&self, id: &str) -> Option<&Company> {
        self.companies.get(&CompanyId::new(id))
    }
}
