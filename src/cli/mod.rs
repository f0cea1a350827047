//! Plain-text rendering for the command line tools.

use std::fmt;

use crate::board::{MapHex, MapManager};
use crate::coords::{HexSide, HexSides, MapOrientation};
use crate::upgrade::MapUpgrade;

/// Parses a comma separated side list such as `0,3` or `N,SE`, numbers and
/// compass labels mixed freely. Blank input is the empty set.
pub fn parse_sides(input: &str, orientation: MapOrientation) -> Result<HexSides, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<i32>() {
            Ok(n) if (0..6).contains(&n) => Ok(HexSide::get(n)),
            Ok(_) => Err(format!("invalid hex side '{part}', expected 0..5")),
            Err(_) => orientation
                .side_by_label(part)
                .ok_or_else(|| format!("no side labelled '{part}' on {orientation} maps")),
        })
        .collect()
}

/// The hex, its tile, stops and neighbours, one item per line.
pub fn render_hex(map: &MapManager, hex: &MapHex) -> String {
    HexView { map, hex }.to_string()
}

/// One line per candidate in the given order. Hidden candidates are skipped
/// unless `show_all` is set.
pub fn render_upgrades(upgrades: &[MapUpgrade], show_all: bool) -> String {
    UpgradeList { upgrades, show_all }.to_string()
}

struct HexView<'a> {
    map: &'a MapManager,
    hex: &'a MapHex,
}

impl fmt::Display for HexView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.hex;
        let tile = hex.current_tile();
        writeln!(
            f,
            "{} tile {} ({}) rotation {}",
            hex.id(),
            tile.id(),
            tile.colour(),
            hex.rotation()
        )?;
        for stop in hex.stops() {
            write!(
                f,
                "  stop {} {} value {} slots {}/{} run-to {} run-through {} score {}",
                stop.number(),
                stop.stop_type(),
                stop.value(),
                stop.tokens().len(),
                stop.slots(),
                stop.run_to_allowed(),
                stop.run_through_allowed(),
                stop.score_type(),
            )?;
            if let Some(mutex) = stop.mutex_id() {
                write!(f, " mutex {mutex}")?;
            }
            if !stop.tokens().is_empty() {
                let tokens: Vec<&str> = stop.tokens().iter().map(|c| c.as_str()).collect();
                write!(f, " tokens {}", tokens.join(","))?;
            }
            writeln!(f)?;
        }
        for side in HexSide::ALL {
            let label = self.map.orientation().side_label(side);
            let edge = match self.map.neighbour(hex.id(), side) {
                Some(other) => other.id(),
                None if hex.impassable_sides().contains(side) => "impassable",
                None => "-",
            };
            writeln!(f, "  {side} {label:<2} {edge}")?;
        }
        Ok(())
    }
}

struct UpgradeList<'a> {
    upgrades: &'a [MapUpgrade],
    show_all: bool,
}

impl fmt::Display for UpgradeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self
            .upgrades
            .iter()
            .filter(|upgrade| self.show_all || upgrade.is_visible());
        for (idx, upgrade) in shown.enumerate() {
            let status = if upgrade.is_valid() { "ok" } else { "--" };
            write!(f, "{:>3} {status} ", idx + 1)?;
            match upgrade {
                MapUpgrade::Tile(tile) => {
                    let target = tile.target();
                    write!(f, "tile {:<6} {:<7}", target.id(), target.colour().to_string())?;
                    if let Some(rotations) = tile.rotations() {
                        write!(f, " rotations {rotations}")?;
                    }
                    if let Some(reasons) = tile.validations().filter(|r| !r.is_empty()) {
                        let keys: Vec<String> = reasons.iter().map(ToString::to_string).collect();
                        write!(f, " {}", keys.join(" "))?;
                    }
                }
                MapUpgrade::Token(token) => {
                    write!(
                        f,
                        "token stop {} value {} free {}",
                        token.stop(),
                        token.value(),
                        token.free_slots()
                    )?;
                }
            }
            if !upgrade.is_visible() {
                f.write_str(" (hidden)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
