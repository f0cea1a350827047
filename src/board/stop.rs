use std::sync::Arc;

use crate::access::{Access, AccessCascade, AccessDefaults, ResolvedAccess};
use crate::game::CompanyId;
use crate::tile::Station;
use crate::types::{RunPermission, ScoreType, StopType};

/// Override levels above the station, as seen from one hex.
#[derive(Debug, Clone, Copy)]
pub struct AccessContext<'a> {
    pub tile: Option<&'a Access>,
    pub hex: Option<&'a Access>,
    pub tile_defaults: &'a AccessDefaults,
    pub map_defaults: &'a AccessDefaults,
}

/// A junction on one particular hex: the station of the tile currently laid
/// there, plus the tokens placed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stop {
    number: u8,
    station: Arc<Station>,
    tokens: Vec<CompanyId>,
    access: Option<ResolvedAccess>,
}

impl Stop {
    pub fn new(number: u8, station: Arc<Station>) -> Self {
        Self {
            number,
            station,
            tokens: Vec::new(),
            access: None,
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn station(&self) -> &Arc<Station> {
        &self.station
    }

    pub fn related_station_number(&self) -> u8 {
        self.station.number
    }

    pub fn value(&self) -> i32 {
        self.station.value
    }

    pub fn slots(&self) -> usize {
        self.station.base_slots
    }

    pub fn tokens(&self) -> &[CompanyId] {
        &self.tokens
    }

    pub fn free_slots(&self) -> usize {
        self.slots().saturating_sub(self.tokens.len())
    }

    pub fn has_free_slot(&self) -> bool {
        self.free_slots() > 0
    }

    pub fn has_token_of(&self, company: &CompanyId) -> bool {
        self.tokens.contains(company)
    }

    /// Refuses the token when every slot is taken.
    pub(crate) fn add_token(&mut self, company: CompanyId) -> bool {
        if !self.has_free_slot() {
            return false;
        }
        self.tokens.push(company);
        true
    }

    /// Points the stop at the station of a newly laid tile.
    pub(crate) fn rebind(&mut self, station: Arc<Station>) {
        self.station = station;
        self.invalidate();
    }

    pub(crate) fn absorb(&mut self, other: Stop) {
        self.tokens.extend(other.tokens);
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.access = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.access.is_some()
    }

    /// Resolves the stop's access rules once; later calls are no-ops until
    /// [`Stop::invalidate`] runs.
    pub fn init_stop_parameters(&mut self, cx: &AccessContext<'_>) {
        if self.access.is_some() {
            return;
        }
        let station = self.station.access.as_ref();
        let stop_type = AccessCascade::new()
            .level(station)
            .level(cx.tile)
            .level(cx.hex)
            .stop_type(self.station.stop_type);
        let builtin = Access::builtin(stop_type);
        let resolved = AccessCascade::new()
            .level(station)
            .level(cx.tile)
            .level(cx.hex)
            .level(cx.tile_defaults.get(stop_type))
            .level(cx.map_defaults.get(stop_type))
            .level(Some(&builtin))
            .resolve(stop_type);
        self.access = Some(resolved);
    }

    fn rule<T>(&self, field: impl Fn(&ResolvedAccess) -> T) -> T {
        match &self.access {
            Some(access) => field(access),
            None => field(&ResolvedAccess::builtin(self.station.stop_type)),
        }
    }

    pub fn stop_type(&self) -> StopType {
        self.rule(|access| access.stop_type)
    }

    pub fn run_to_allowed(&self) -> RunPermission {
        self.rule(|access| access.run_to)
    }

    pub fn run_through_allowed(&self) -> RunPermission {
        self.rule(|access| access.run_through)
    }

    pub fn score_type(&self) -> ScoreType {
        self.rule(|access| access.score)
    }

    pub fn mutex_id(&self) -> Option<&str> {
        self.access
            .as_ref()
            .and_then(|access| access.mutex_id.as_deref())
    }

    /// `running` is set while trains run; outside of it (planning, laying)
    /// token-only stops are treated as reachable.
    pub fn is_run_to_allowed_for(&self, company: &CompanyId, running: bool) -> bool {
        match self.run_to_allowed() {
            RunPermission::Yes => true,
            RunPermission::No => false,
            RunPermission::TokenOnly => !running || self.has_token_of(company),
        }
    }

    pub fn is_run_through_allowed_for(&self, company: &CompanyId) -> bool {
        match self.run_through_allowed() {
            RunPermission::Yes => {
                self.tokens.is_empty() || self.has_token_of(company) || self.has_free_slot()
            }
            RunPermission::No => false,
            RunPermission::TokenOnly => self.has_token_of(company),
        }
    }
}
