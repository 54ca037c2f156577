use anyhow::Result;
use std::collections::BTreeMap;

use crate::model::FlightRecord;

/// Shown for flights that are neither tracked nor highlighted.
pub const PLANE_ICON: &str = "✈️";
/// Shown for tracked or highlighted flights with no bound icon.
pub const TARGET_ICON: &str = "🎯";

pub type IconMap = BTreeMap<String, String>;

/// Which binding a tracked flight was matched by upstream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconTable {
    Callsign,
    Registration,
}

impl IconTable {
    pub fn for_tracked_by(tracked_by: &str) -> Self {
        if tracked_by.to_lowercase() == "registration" {
            IconTable::Registration
        } else {
            IconTable::Callsign
        }
    }
}

/// Source of icon bindings. Lookups may fail or panic; either aborts the render
/// that asked for it.
pub trait IconLookup {
    fn lookup(&self, table: IconTable, key: &str) -> Result<Option<String>>;
}

/// Configured icon tables. The per-binding tables fall back to `base`
/// when they are not configured.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IconTables {
    pub base: IconMap,
    pub callsign: Option<IconMap>,
    pub registration: Option<IconMap>,
}

impl IconTables {
    pub fn table(&self, table: IconTable) -> &IconMap {
        let specific = match table {
            IconTable::Callsign => self.callsign.as_ref(),
            IconTable::Registration => self.registration.as_ref(),
        };
        specific.unwrap_or(&self.base)
    }
}

impl IconLookup for IconTables {
    fn lookup(&self, table: IconTable, key: &str) -> Result<Option<String>> {
        Ok(self.table(table).get(key).cloned())
    }
}

/// Picks the single icon for a flight.
///
/// Untracked, non-highlight flights get [`PLANE_ICON`]. Otherwise the table
/// chosen by `tracked_by` is consulted for the uppercased tracked target,
/// then the callsign, then the highlight callsign; the first non-blank
/// binding wins and [`TARGET_ICON`] is the terminal fallback.
pub fn resolve_icon(
    flight: &FlightRecord,
    highlight_callsign: &str,
    icons: &dyn IconLookup,
) -> Result<String> {
    let callsign = flight.callsign();
    let is_highlight = callsign == highlight_callsign;
    if !is_highlight && !flight.tracked {
        return Ok(PLANE_ICON.to_string());
    }

    let table = IconTable::for_tracked_by(flight.tracked_by());
    let target = flight.tracked_target().to_uppercase();
    for key in [target.as_str(), callsign, highlight_callsign] {
        if key.is_empty() {
            continue;
        }
        if let Some(icon) = icons.lookup(table, key)? {
            if !icon.trim().is_empty() {
                return Ok(icon);
            }
        }
    }
    Ok(TARGET_ICON.to_string())
}
