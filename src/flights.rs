use anyhow::Result;
use serde_json::Value;
use tracing::trace;

use crate::card_config::CardConfig;
use crate::format::{format_direction, format_metric, source_badge, PLACEHOLDER};
use crate::icons::{resolve_icon, IconLookup};
use crate::model::FlightRecord;
use crate::view::FlightItem;

/// Takes the first `max_items` feed entries, then moves tracked flights to
/// the front. The sort is stable, so feed order survives within each group.
/// Entries past the cap are never inspected.
pub fn select_flights(
    entries: &[Value],
    max_items: usize,
    prioritize_tracked: bool,
) -> Result<Vec<FlightRecord>> {
    let mut flights = entries
        .iter()
        .take(max_items)
        .enumerate()
        .map(|(idx, entry)| FlightRecord::from_value(entry, idx))
        .collect::<Result<Vec<_>>>()?;
    if prioritize_tracked {
        flights.sort_by_key(|flight| !flight.tracked);
    }
    Ok(flights)
}

pub fn build_items(
    entries: &[Value],
    config: &CardConfig,
    icons: &dyn IconLookup,
) -> Result<Vec<FlightItem>> {
    select_flights(entries, config.max_items, config.prioritize_tracked)?
        .iter()
        .map(|flight| normalize_flight(flight, config, icons))
        .collect()
}

pub fn normalize_flight(
    flight: &FlightRecord,
    config: &CardConfig,
    icons: &dyn IconLookup,
) -> Result<FlightItem> {
    let registration = flight.registration();
    let hex = flight.hex();
    let callsign = flight.callsign();
    let airline = flight.airline();
    let model = flight.aircraft_model();

    let icon = resolve_icon(flight, &config.highlight_callsign, icons)?;
    trace!(hex, callsign, %icon, "normalized flight");

    let highlight =
        (callsign == config.highlight_callsign).then(|| config.highlight_callsign.clone());
    let subline = if airline.is_empty() && model.is_empty() {
        None
    } else {
        Some(format!("{airline} {model}"))
    };
    let code_line = match (model.is_empty(), hex.is_empty()) {
        (true, true) => None,
        (false, true) => Some(model.to_string()),
        (true, false) => Some(hex.to_string()),
        (false, false) => Some(format!("{model} · {hex}")),
    };

    Ok(FlightItem {
        icon,
        tracked: flight.tracked,
        highlight,
        title: title_for(registration, hex),
        subline,
        source_badge: source_badge(flight.source.as_deref()),
        ident: ident_for(callsign, registration, hex),
        altitude: format_metric(flight.alt_m.as_ref(), 0, "m"),
        speed: format_metric(flight.spd_kmh.as_ref(), 0, "km/h"),
        distance: format_metric(flight.dist_km.as_ref(), 1, "km"),
        direction: format_direction(flight.dir_deg.as_ref()),
        code_line,
    })
}

/// Registration, then `HEX: <hex>`, then the placeholder.
fn title_for(registration: &str, hex: &str) -> String {
    if !registration.is_empty() {
        registration.to_string()
    } else if !hex.is_empty() {
        format!("HEX: {hex}")
    } else {
        PLACEHOLDER.to_string()
    }
}

/// Callsign, then registration, then `HEX <hex>`, then the placeholder.
fn ident_for(callsign: &str, registration: &str, hex: &str) -> String {
    if !callsign.is_empty() {
        callsign.to_string()
    } else if !registration.is_empty() {
        registration.to_string()
    } else if !hex.is_empty() {
        format!("HEX {hex}")
    } else {
        PLACEHOLDER.to_string()
    }
}
