use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Full host state table at one point in time.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Snapshot {
    #[serde(default)]
    pub states: BTreeMap<String, EntityState>,
}

impl Snapshot {
    pub fn entity(&self, entity_id: &str) -> Option<&EntityState> {
        if entity_id.trim().is_empty() {
            return None;
        }
        self.states.get(entity_id)
    }
}

/// One entry of the host state table: a primary state value plus an
/// untyped attribute bag.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityState {
    #[serde(default, deserialize_with = "de_text_from_any")]
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    /// Attribute lookup where `null` counts as absent.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name).filter(|value| !value.is_null())
    }

    /// Raw `flights` entries; anything other than an array reads as empty.
    pub fn flight_entries(&self) -> &[Value] {
        match self.attr("flights") {
            Some(Value::Array(entries)) => entries.as_slice(),
            _ => &[],
        }
    }

    pub fn status_fields(&self) -> StatusFields {
        StatusFields::deserialize(Value::Object(self.attributes.clone())).unwrap_or_default()
    }
}

/// One aircraft as delivered by the merge pipeline. Every field is optional;
/// unusable values read as absent instead of failing the record.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FlightRecord {
    #[serde(default, deserialize_with = "de_opt_text")]
    pub registration: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub hex: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub callsign: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub airline: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub aircraft_model: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub tracked: bool,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub tracked_target: Option<String>,
    #[serde(default, deserialize_with = "de_opt_label")]
    pub tracked_by: Option<String>,
    #[serde(default, deserialize_with = "de_opt_label")]
    pub source: Option<String>,
    #[serde(default)]
    pub alt_m: Option<Value>,
    #[serde(default)]
    pub spd_kmh: Option<Value>,
    #[serde(default)]
    pub dist_km: Option<Value>,
    #[serde(default)]
    pub dir_deg: Option<Value>,
}

impl FlightRecord {
    /// Reads one `flights` entry. Entries that are not objects are malformed
    /// and abort the render.
    pub fn from_value(value: &Value, index: usize) -> Result<Self> {
        if !value.is_object() {
            bail!(
                "malformed flight record at index {index}: expected an object, got {}",
                value_kind(value)
            );
        }
        FlightRecord::deserialize(value)
            .with_context(|| format!("malformed flight record at index {index}"))
    }

    pub fn registration(&self) -> &str {
        trimmed(&self.registration)
    }

    pub fn hex(&self) -> &str {
        trimmed(&self.hex)
    }

    pub fn callsign(&self) -> &str {
        trimmed(&self.callsign)
    }

    pub fn airline(&self) -> &str {
        trimmed(&self.airline)
    }

    pub fn aircraft_model(&self) -> &str {
        trimmed(&self.aircraft_model)
    }

    pub fn tracked_target(&self) -> &str {
        trimmed(&self.tracked_target)
    }

    pub fn tracked_by(&self) -> &str {
        self.tracked_by.as_deref().unwrap_or("")
    }
}

/// Attributes of the aggregate status entity.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StatusFields {
    #[serde(default)]
    pub last_update: Option<Value>,
    #[serde(default)]
    pub fr24_count: Option<Value>,
    #[serde(default)]
    pub adsb_count: Option<Value>,
    #[serde(default)]
    pub merged_count: Option<Value>,
    #[serde(default, deserialize_with = "de_opt_flag")]
    pub tracking_enabled: Option<bool>,
    #[serde(default, deserialize_with = "de_opt_i64_from_any")]
    pub tracked_active_count: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_labels")]
    pub tracked_active: Option<Vec<String>>,
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Scalar rendered as text; composite values have no text form.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub(crate) fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

pub(crate) fn de_opt_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(&Value::deserialize(deserializer)?))
}

fn de_text_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn de_opt_labels<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(items.iter().filter_map(scalar_text).collect())),
        _ => Ok(None),
    }
}

fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

pub(crate) fn de_opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(Some(flag)),
        _ => Ok(None),
    }
}

pub(crate) fn de_opt_i64_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(Some(value))
            } else {
                Ok(number
                    .as_f64()
                    .filter(|value| value.is_finite())
                    .map(|value| value.floor() as i64))
            }
        }
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else if let Ok(value) = trimmed.parse::<i64>() {
                Ok(Some(value))
            } else {
                Ok(trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(|value| value.floor() as i64))
            }
        }
        _ => Ok(None),
    }
}
