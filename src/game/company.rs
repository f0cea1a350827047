use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CompanyConfig;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub String);

impl CompanyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CompanyId {
    fn from(id: &str) -> Self {
        CompanyId::new(id)
    }
}

/// The parts of a public company the map rules need to know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub home_hexes: BTreeSet<String>,
}

impl Company {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: CompanyId::new(id),
            home_hexes: BTreeSet::new(),
        }
    }

    pub fn with_home(mut self, hex: impl Into<String>) -> Self {
        self.home_hexes.insert(hex.into());
        self
    }

    pub fn from_config(config: &CompanyConfig) -> Self {
        Self {
            id: CompanyId::new(config.id.clone()),
            home_hexes: config.home_hexes.iter().cloned().collect(),
        }
    }

    pub fn is_home_hex(&self, hex: &str) -> bool {
        self.home_hexes.contains(hex)
    }
}
