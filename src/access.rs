//! Run-to / run-through / scoring rules for stops and the layered override
//! resolution that turns per-level overrides into a stop's effective rules.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{AccessConfig, ConfigError};
use crate::types::{RunPermission, ScoreType, StopType};

/// A partial set of access rules. Every field is optional: an absent field
/// defers to the next, less specific, level of the cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub stop_type: Option<StopType>,
    pub run_to: Option<RunPermission>,
    pub run_through: Option<RunPermission>,
    pub score: Option<ScoreType>,
    pub mutex_id: Option<String>,
}

impl Access {
    /// The built-in rules for a stop type. These are always complete.
    pub const fn builtin(stop_type: StopType) -> Access {
        let (run_to, run_through, score) = builtin_rules(stop_type);
        Access {
            stop_type: Some(stop_type),
            run_to: Some(run_to),
            run_through: Some(run_through),
            score: Some(score),
            mutex_id: None,
        }
    }

    /// Validates raw configuration values. Absent values stay absent;
    /// present values that are not recognised are rejected with the owner
    /// and field named.
    pub fn from_config(owner: &str, config: &AccessConfig) -> Result<Access, ConfigError> {
        Ok(Access {
            stop_type: parse_field(owner, "type", config.stop_type.as_deref())?,
            run_to: parse_field(owner, "runTo", config.run_to.as_deref())?,
            run_through: parse_field(owner, "runThrough", config.run_through.as_deref())?,
            score: parse_field(owner, "score", config.score.as_deref())?,
            mutex_id: config
                .mutex_id
                .as_ref()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Access::default()
    }
}

const fn builtin_rules(stop_type: StopType) -> (RunPermission, RunPermission, ScoreType) {
    use RunPermission::{No, Yes};
    match stop_type {
        StopType::City => (Yes, Yes, ScoreType::Major),
        StopType::Town => (Yes, Yes, ScoreType::Minor),
        StopType::Offmap => (Yes, No, ScoreType::Major),
        StopType::Mine => (No, No, ScoreType::Minor),
        StopType::Port => (Yes, No, ScoreType::Minor),
        StopType::Pass => (Yes, Yes, ScoreType::No),
    }
}

fn parse_field<T: FromStr>(
    owner: &str,
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => T::from_str(value)
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                owner: owner.to_string(),
                field,
                value: value.to_string(),
            }),
    }
}

/// Type-keyed default rules configured for a whole tile set or map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessDefaults {
    by_type: HashMap<StopType, Access>,
}

impl AccessDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each entry must name the stop type it applies to.
    pub fn from_config(owner: &str, entries: &[AccessConfig]) -> Result<Self, ConfigError> {
        let mut by_type = HashMap::new();
        for entry in entries {
            let access = Access::from_config(owner, entry)?;
            let stop_type = access.stop_type.ok_or_else(|| ConfigError::MissingAttribute {
                owner: owner.to_string(),
                attribute: "type",
            })?;
            by_type.insert(stop_type, access);
        }
        Ok(Self { by_type })
    }

    pub fn with(mut self, stop_type: StopType, access: Access) -> Self {
        self.by_type.insert(stop_type, access);
        self
    }

    pub fn get(&self, stop_type: StopType) -> Option<&Access> {
        self.by_type.get(&stop_type)
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

/// Fully resolved rules for one stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccess {
    pub stop_type: StopType,
    pub run_to: RunPermission,
    pub run_through: RunPermission,
    pub score: ScoreType,
    pub mutex_id: Option<String>,
}

impl ResolvedAccess {
    pub fn builtin(stop_type: StopType) -> Self {
        let (run_to, run_through, score) = builtin_rules(stop_type);
        Self {
            stop_type,
            run_to,
            run_through,
            score,
            mutex_id: None,
        }
    }
}

/// Ordered list of override levels, most specific first. Each field is
/// resolved on its own: the first level that sets it wins.
#[derive(Debug, Default)]
pub struct AccessCascade<'a> {
    levels: Vec<&'a Access>,
}

impl<'a> AccessCascade<'a> {
    pub fn new() -> Self {
        Self { levels: Vec::new() }
    }

    pub fn level(mut self, access: Option<&'a Access>) -> Self {
        if let Some(access) = access {
            self.levels.push(access);
        }
        self
    }

    pub fn levels(&self) -> usize {
        self.levels.len()
    }

    fn first<T>(&self, field: impl Fn(&'a Access) -> Option<T>) -> Option<T> {
        self.levels.iter().find_map(|&access| field(access))
    }

    /// The stop type as overridden by the cascade levels, or `fallback`.
    pub fn stop_type(&self, fallback: StopType) -> StopType {
        self.first(|access| access.stop_type).unwrap_or(fallback)
    }

    /// Resolves every field; anything still unset after the last level takes
    /// the built-in city rules. Only `mutex_id` may remain empty.
    pub fn resolve(&self, stop_type: StopType) -> ResolvedAccess {
        let city = ResolvedAccess::builtin(StopType::City);
        ResolvedAccess {
            stop_type,
            run_to: self.first(|access| access.run_to).unwrap_or(city.run_to),
            run_through: self
                .first(|access| access.run_through)
                .unwrap_or(city.run_through),
            score: self.first(|access| access.score).unwrap_or(city.score),
            mutex_id: self.first(|access| access.mutex_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn builtin_table() {
        use RunPermission::{No, Yes};
        let expected = [
            (StopType::City, Yes, Yes, ScoreType::Major),
            (StopType::Town, Yes, Yes, ScoreType::Minor),
            (StopType::Offmap, Yes, No, ScoreType::Major),
            (StopType::Mine, No, No, ScoreType::Minor),
            (StopType::Port, Yes, No, ScoreType::Minor),
            (StopType::Pass, Yes, Yes, ScoreType::No),
        ];
        for (stop_type, run_to, run_through, score) in expected {
            let access = Access::builtin(stop_type);
            assert_eq!(access.run_to, Some(run_to), "{stop_type}");
            assert_eq!(access.run_through, Some(run_through), "{stop_type}");
            assert_eq!(access.score, Some(score), "{stop_type}");
            assert_eq!(access.mutex_id, None);
        }
        assert_eq!(StopType::iter().count(), expected.len());
    }

    #[test]
    fn parses_case_insensitively() {
        let config = AccessConfig {
            run_to: Some("tokenonly".into()),
            run_through: Some("No".into()),
            score: Some("minor".into()),
            mutex_id: Some(" north ".into()),
            ..AccessConfig::default()
        };
        let access = Access::from_config("hex B4", &config).unwrap();
        assert_eq!(access.run_to, Some(RunPermission::TokenOnly));
        assert_eq!(access.run_through, Some(RunPermission::No));
        assert_eq!(access.score, Some(ScoreType::Minor));
        assert_eq!(access.mutex_id.as_deref(), Some("north"));
        assert_eq!(access.stop_type, None);
    }

    #[test]
    fn invalid_value_names_owner_and_field() {
        let config = AccessConfig {
            run_through: Some("sometimes".into()),
            ..AccessConfig::default()
        };
        let err = Access::from_config("tile 57", &config).unwrap_err();
        match &err {
            ConfigError::InvalidValue {
                owner,
                field,
                value,
            } => {
                assert_eq!(owner, "tile 57");
                assert_eq!(*field, "runThrough");
                assert_eq!(value, "sometimes");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("tile 57"));
    }

    #[test]
    fn defaults_require_a_stop_type() {
        let entries = vec![AccessConfig {
            run_to: Some("NO".into()),
            ..AccessConfig::default()
        }];
        assert!(matches!(
            AccessDefaults::from_config("map", &entries),
            Err(ConfigError::MissingAttribute { attribute: "type", .. })
        ));
    }

    #[test]
    fn cascade_resolves_each_field_independently() {
        let station = Access {
            score: Some(ScoreType::Minor),
            ..Access::default()
        };
        let hex = Access {
            run_to: Some(RunPermission::TokenOnly),
            mutex_id: Some("m1".into()),
            ..Access::default()
        };
        let manager = Access {
            run_to: Some(RunPermission::No),
            run_through: Some(RunPermission::No),
            ..Access::default()
        };
        let builtin = Access::builtin(StopType::City);
        let cascade = AccessCascade::new()
            .level(Some(&station))
            .level(None)
            .level(Some(&hex))
            .level(Some(&manager))
            .level(Some(&builtin));
        assert_eq!(cascade.levels(), 4);

        let resolved = cascade.resolve(StopType::City);
        assert_eq!(resolved.run_to, RunPermission::TokenOnly);
        assert_eq!(resolved.run_through, RunPermission::No);
        assert_eq!(resolved.score, ScoreType::Minor);
        assert_eq!(resolved.mutex_id.as_deref(), Some("m1"));
    }

    #[test]
    fn empty_cascade_falls_back_to_city_rules() {
        let resolved = AccessCascade::new().resolve(StopType::Mine);
        assert_eq!(resolved.run_to, RunPermission::Yes);
        assert_eq!(resolved.run_through, RunPermission::Yes);
        assert_eq!(resolved.score, ScoreType::Major);
        assert_eq!(resolved.mutex_id, None);
        assert_eq!(resolved.stop_type, StopType::Mine);
    }
}
