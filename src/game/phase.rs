use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, PhaseConfig};
use crate::types::TileColour;

/// A game phase as far as tile laying is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub tile_colours: BTreeSet<TileColour>,
}

impl Phase {
    pub fn new<I>(name: impl Into<String>, tile_colours: I) -> Self
    where
        I: IntoIterator<Item = TileColour>,
    {
        Self {
            name: name.into(),
            tile_colours: tile_colours.into_iter().collect(),
        }
    }

    pub fn from_config(config: &PhaseConfig) -> Result<Self, ConfigError> {
        let tile_colours = config
            .tile_colours
            .iter()
            .map(|colour| {
                TileColour::from_str(colour.trim()).map_err(|_| ConfigError::InvalidValue {
                    owner: format!("phase {}", config.name),
                    field: "tileColours",
                    value: colour.clone(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            name: config.name.clone(),
            tile_colours,
        })
    }

    pub fn is_tile_colour_allowed(&self, colour: TileColour) -> bool {
        self.tile_colours.contains(&colour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colours() {
        let phase = Phase::from_config(&PhaseConfig {
            name: "2".into(),
            tile_colours: vec!["yellow".into(), "Green".into()],
        })
        .unwrap();
        assert!(phase.is_tile_colour_allowed(TileColour::Green));
        assert!(!phase.is_tile_colour_allowed(TileColour::Brown));

        let err = Phase::from_config(&PhaseConfig {
            name: "3".into(),
            tile_colours: vec!["teal".into()],
        })
        .unwrap_err();
        assert!(err.to_string().contains("phase 3"));
    }
}
