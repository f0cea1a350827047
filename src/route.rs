use std::collections::HashMap;

use crate::board::Stop;
use crate::game::CompanyId;

/// Why a train may not run along a sequence of stops.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunViolation {
    #[error("a run needs at least two stops, got {0}")]
    TooShort(usize),
    #[error("{company} may not run to stop {stop} on {hex}")]
    RunToRefused {
        hex: String,
        stop: u8,
        company: CompanyId,
    },
    #[error("{company} may not run through stop {stop} on {hex}")]
    RunThroughRefused {
        hex: String,
        stop: u8,
        company: CompanyId,
    },
    #[error("stops on {first} and {second} share mutex group {mutex}")]
    MutexConflict {
        mutex: String,
        first: String,
        second: String,
    },
}

/// Checks one train run, given as the stops it visits in order with the hex
/// each is on. Both ends must accept the train and every stop in between
/// must let it pass; at most one stop per mutex group may be visited.
pub fn check_run(visits: &[(&str, &Stop)], company: &CompanyId) -> Result<(), RunViolation> {
    if visits.len() < 2 {
        return Err(RunViolation::TooShort(visits.len()));
    }
    let last = visits.len() - 1;
    let mut groups: HashMap<&str, &str> = HashMap::new();

    for (idx, &(hex, stop)) in visits.iter().enumerate() {
        if idx == 0 || idx == last {
            if !stop.is_run_to_allowed_for(company, true) {
                return Err(RunViolation::RunToRefused {
                    hex: hex.to_string(),
                    stop: stop.number(),
                    company: company.clone(),
                });
            }
        } else if !stop.is_run_through_allowed_for(company) {
            return Err(RunViolation::RunThroughRefused {
                hex: hex.to_string(),
                stop: stop.number(),
                company: company.clone(),
            });
        }

        if let Some(mutex) = stop.mutex_id() {
            if let Some(first) = groups.insert(mutex, hex) {
                return Err(RunViolation::MutexConflict {
                    mutex: mutex.to_string(),
                    first: first.to_string(),
                    second: hex.to_string(),
                });
            }
        }
    }
    Ok(())
}
