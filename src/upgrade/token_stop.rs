use std::cmp::Ordering;

use crate::board::Stop;
use crate::game::LayToken;

/// A candidate token lay on one stop. Always valid; only its order matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStopUpgrade {
    hex: String,
    stop: u8,
    related_station: u8,
    value: i32,
    free_slots: usize,
    action: LayToken,
    visible: bool,
}

impl TokenStopUpgrade {
    pub fn new(hex: &str, stop: &Stop, action: LayToken) -> Self {
        Self {
            hex: hex.to_string(),
            stop: stop.number(),
            related_station: stop.related_station_number(),
            value: stop.value(),
            free_slots: stop.free_slots(),
            action,
            visible: true,
        }
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn stop(&self) -> u8 {
        self.stop
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn free_slots(&self) -> usize {
        self.free_slots
    }

    pub fn action(&self) -> &LayToken {
        &self.action
    }

    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Base lays first, more specific lay types first, richer stations
    /// first, nearly full stops first, then by number.
    pub fn compare(&self, other: &TokenStopUpgrade) -> Ordering {
        other
            .action
            .is_base()
            .cmp(&self.action.is_base())
            .then_with(|| other.action.base_type().cmp(&self.action.base_type()))
            .then_with(|| other.value.cmp(&self.value))
            .then_with(|| self.free_slots.cmp(&other.free_slots))
            .then_with(|| self.related_station.cmp(&other.related_station))
            .then_with(|| self.stop.cmp(&other.stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::game::{BaseTokenLayType, Company, CompanyId};
    use crate::tile::Station;
    use crate::types::StopType;

    fn stop(number: u8, value: i32, slots: usize, tokens: usize) -> Stop {
        let station = Station::new(number, StopType::City)
            .with_value(value)
            .with_slots(slots);
        let mut stop = Stop::new(number, Arc::new(station));
        for idx in 0..tokens {
            stop.add_token(CompanyId::new(format!("X{idx}")));
        }
        stop
    }

    fn base(lay_type: BaseTokenLayType) -> LayToken {
        LayToken::base(Company::new("PRR"), lay_type)
    }

    #[test]
    fn fewer_free_slots_sort_first() {
        let generic = base(BaseTokenLayType::Generic);
        let nearly_full = TokenStopUpgrade::new("B4", &stop(2, 30, 2, 1), generic.clone());
        let empty = TokenStopUpgrade::new("B4", &stop(1, 30, 3, 0), generic);
        assert_eq!(nearly_full.free_slots(), 1);
        assert_eq!(nearly_full.compare(&empty), Ordering::Less);
        assert_eq!(empty.compare(&nearly_full), Ordering::Greater);
    }

    #[test]
    fn base_lays_and_lay_types_come_before_value() {
        let bonus = TokenStopUpgrade::new(
            "B4",
            &stop(1, 100, 1, 0),
            LayToken::bonus(Company::new("PRR")),
        );
        let generic = TokenStopUpgrade::new("B4", &stop(2, 10, 1, 0), base(BaseTokenLayType::Generic));
        let home = TokenStopUpgrade::new("B4", &stop(3, 10, 1, 0), base(BaseTokenLayType::HomeCity));

        let mut upgrades = vec![bonus.clone(), generic.clone(), home.clone()];
        upgrades.sort_by(TokenStopUpgrade::compare);
        assert_eq!(upgrades, vec![home, generic, bonus]);
    }

    #[test]
    fn value_then_number_break_ties() {
        let lay = base(BaseTokenLayType::Generic);
        let rich = TokenStopUpgrade::new("B4", &stop(2, 40, 1, 0), lay.clone());
        let poor = TokenStopUpgrade::new("B4", &stop(1, 20, 1, 0), lay.clone());
        assert_eq!(rich.compare(&poor), Ordering::Less);

        let first = TokenStopUpgrade::new("B4", &stop(1, 20, 1, 0), lay.clone());
        let second = TokenStopUpgrade::new("B4", &stop(2, 20, 1, 0), lay);
        assert_eq!(first.compare(&second), Ordering::Less);
        assert!(first.is_valid());
    }
}
