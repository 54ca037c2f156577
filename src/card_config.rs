use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::format::finite_number;
use crate::icons::{IconMap, IconTables};
use crate::model::{de_opt_flag, de_opt_label, de_opt_text, scalar_text};

pub const DEFAULT_TITLE: &str = "Flugzeuge";
pub const DEFAULT_HIGHLIGHT_CALLSIGN: &str = "CHX16";
pub const DEFAULT_MAX_ITEMS: usize = 30;
pub const DEFAULT_SHOW_DEBUG: bool = false;
pub const DEFAULT_PRIORITIZE_TRACKED: bool = true;
pub const DEFAULT_HIGHLIGHT_ICON: &str = "🚑🚁";
pub const DEFAULT_TIME_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

pub const MISSING_ENTITY: &str = "You need to define an entity (sensor.air_traffic_merged)";

/// Validated card configuration. Replaced wholesale, never merged.
#[derive(Clone, Debug, PartialEq)]
pub struct CardConfig {
    pub entity: String,
    pub status_entity: Option<String>,
    pub title: String,
    pub highlight_callsign: String,
    pub max_items: usize,
    pub show_debug: bool,
    pub icons: IconTables,
    pub prioritize_tracked: bool,
    pub time_format: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawCardConfig {
    #[serde(default, deserialize_with = "de_opt_text")]
    entity: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    status_entity: Option<String>,
    #[serde(default, deserialize_with = "de_opt_label")]
    title: Option<String>,
    #[serde(default, deserialize_with = "de_opt_label")]
    highlight_callsign: Option<String>,
    #[serde(default)]
    max_items: Option<Value>,
    #[serde(default, deserialize_with = "de_opt_flag")]
    show_debug: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_icon_map")]
    tracked_icons: Option<IconMap>,
    #[serde(default, deserialize_with = "de_opt_icon_map")]
    tracked_icons_callsign: Option<IconMap>,
    #[serde(default, deserialize_with = "de_opt_icon_map")]
    tracked_icons_registration: Option<IconMap>,
    #[serde(default, deserialize_with = "de_opt_flag")]
    prioritize_tracked: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_text")]
    time_format: Option<String>,
}

impl CardConfig {
    /// Validates a host-supplied configuration object. Fails when the object
    /// is absent or lacks a non-empty `entity`.
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        let value = match value {
            Some(value) if value.is_object() => value,
            _ => bail!(MISSING_ENTITY),
        };
        let raw = RawCardConfig::deserialize(value).context("Invalid card configuration")?;
        Self::resolve(raw)
    }

    pub fn for_entity(entity: &str) -> Result<Self> {
        Self::from_value(Some(&serde_json::json!({ "entity": entity })))
    }

    fn resolve(raw: RawCardConfig) -> Result<Self> {
        let entity = match raw.entity {
            Some(entity) if !entity.trim().is_empty() => entity.trim().to_string(),
            _ => bail!(MISSING_ENTITY),
        };
        let status_entity = raw
            .status_entity
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let highlight_callsign = raw
            .highlight_callsign
            .unwrap_or_else(|| DEFAULT_HIGHLIGHT_CALLSIGN.to_string());
        let base = raw.tracked_icons.unwrap_or_else(|| {
            IconMap::from([(highlight_callsign.clone(), DEFAULT_HIGHLIGHT_ICON.to_string())])
        });
        let time_format = match raw.time_format {
            Some(fmt) if valid_time_format(&fmt) => fmt,
            Some(fmt) => {
                warn!("ignoring invalid time_format {fmt:?}");
                DEFAULT_TIME_FORMAT.to_string()
            }
            None => DEFAULT_TIME_FORMAT.to_string(),
        };

        Ok(CardConfig {
            entity,
            status_entity,
            title: raw.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            highlight_callsign,
            max_items: resolve_max_items(raw.max_items.as_ref()),
            show_debug: raw.show_debug.unwrap_or(DEFAULT_SHOW_DEBUG),
            icons: IconTables {
                base,
                callsign: raw.tracked_icons_callsign,
                registration: raw.tracked_icons_registration,
            },
            prioritize_tracked: raw.prioritize_tracked.unwrap_or(DEFAULT_PRIORITIZE_TRACKED),
            time_format,
        })
    }
}

/// Zero, negative and non-numeric bounds fall back to the default;
/// fractional bounds are floored.
fn resolve_max_items(value: Option<&Value>) -> usize {
    let parsed = value.and_then(finite_number).map(f64::floor);
    match parsed {
        Some(n) if n >= 1.0 => n.min(usize::MAX as f64) as usize,
        _ => DEFAULT_MAX_ITEMS,
    }
}

fn valid_time_format(fmt: &str) -> bool {
    !fmt.is_empty() && StrftimeItems::new(fmt).all(|item| !matches!(item, Item::Error))
}

fn de_opt_icon_map<'de, D>(deserializer: D) -> Result<Option<IconMap>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(entries) => Ok(Some(
            entries
                .iter()
                .filter_map(|(key, value)| scalar_text(value).map(|icon| (key.clone(), icon)))
                .collect(),
        )),
        _ => Ok(None),
    }
}
