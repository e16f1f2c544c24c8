//! Operator-preference filters deciding which broadcasts are surfaced.
//!
//! Checks run in a fixed order and stop at the first rejection:
//!
//! 1. satellite-only category (`CS`)
//! 2. numbered premium network (`J SPORTS 1`, `J SPORTS 4`, ...)
//! 3. excluded named services (region-locked streaming, team channel, extras)
//! 4. recorded / rerun label
//!
//! A rejection is a [`SkipReason`], never an error.
use std::collections::HashSet;
use std::fmt;

use onair_common::BroadcastRecord;
use regex::Regex;

use crate::ScheduleError;

pub const SATELLITE_ONLY_TYPE: &str = "CS";
pub const NUMBERED_NETWORK_PATTERN: &str = r"J SPORTS \d";
pub const REGION_LOCKED_SERVICE: &str = "DAZN";
pub const TEAM_CHANNEL: &str = "虎テレ";
pub const RECORDED_LABEL: &str = "録画";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SatelliteOnly,
    NumberedNetwork,
    ExcludedBroadcaster(String),
    Recorded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SatelliteOnly => f.write_str("satellite-only category"),
            SkipReason::NumberedNetwork => f.write_str("numbered premium network"),
            SkipReason::ExcludedBroadcaster(name) => write!(f, "excluded broadcaster {name}"),
            SkipReason::Recorded => f.write_str("recorded broadcast"),
        }
    }
}

/// Which otherwise-excluded services to let through, plus extra exclusions.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub include_team_channel: bool,
    pub include_region_locked: bool,
    pub excluded_broadcasters: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InclusionFilter {
    numbered_network: Regex,
    excluded: HashSet<String>,
}

impl InclusionFilter {
    pub fn new(options: &FilterOptions) -> Result<Self, ScheduleError> {
        let numbered_network =
            Regex::new(NUMBERED_NETWORK_PATTERN).map_err(|e| ScheduleError::Pattern {
                pattern: NUMBERED_NETWORK_PATTERN,
                message: e.to_string(),
            })?;

        let mut excluded: HashSet<String> = options
            .excluded_broadcasters
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if !options.include_region_locked {
            excluded.insert(REGION_LOCKED_SERVICE.to_string());
        }
        if !options.include_team_channel {
            excluded.insert(TEAM_CHANNEL.to_string());
        }

        Ok(Self {
            numbered_network,
            excluded,
        })
    }

    pub fn is_satellite_only(&self, record: &BroadcastRecord) -> bool {
        record.broadcast_type == SATELLITE_ONLY_TYPE
    }

    pub fn is_numbered_network(&self, record: &BroadcastRecord) -> bool {
        self.numbered_network.is_match(&record.broadcaster)
    }

    pub fn is_excluded_broadcaster(&self, record: &BroadcastRecord) -> bool {
        self.excluded.contains(record.broadcaster.as_str())
    }

    pub fn is_recorded(&self, record: &BroadcastRecord) -> bool {
        record.label == RECORDED_LABEL
    }

    /// Run the checks in order; the first failing one is reported.
    pub fn check(&self, record: &BroadcastRecord) -> Result<(), SkipReason> {
        if self.is_satellite_only(record) {
            return Err(SkipReason::SatelliteOnly);
        }
        if self.is_numbered_network(record) {
            return Err(SkipReason::NumberedNetwork);
        }
        if self.is_excluded_broadcaster(record) {
            return Err(SkipReason::ExcludedBroadcaster(record.broadcaster.clone()));
        }
        if self.is_recorded(record) {
            return Err(SkipReason::Recorded);
        }
        Ok(())
    }

    pub fn admits(&self, record: &BroadcastRecord) -> bool {
        self.check(record).is_ok()
    }
}
