use chrono::{DateTime, Local, TimeZone};
use serde_json::Value;
use std::fmt::{Display, Write};

/// Fallback for any value that cannot be derived.
pub const PLACEHOLDER: &str = "—";

/// Latest instant representable as a host date, in milliseconds.
const MAX_EPOCH_MS: f64 = 8.64e15;

const ARROWS: [&str; 8] = ["⬆️", "↗️", "➡️", "↘️", "⬇️", "↙️", "⬅️", "↖️"];

/// Coerces a loosely-typed value into a finite number. Numeric strings are
/// accepted; blank strings, booleans and composites are not.
pub fn finite_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

pub fn format_number(value: &Value, digits: usize) -> String {
    match finite_number(value) {
        Some(number) => to_fixed(number, digits),
        None => PLACEHOLDER.to_string(),
    }
}

/// Fixed-point text with ties rounded away from zero, so `2.5` becomes `3`
/// and `12.25` at one digit becomes `12.3`.
fn to_fixed(number: f64, digits: usize) -> String {
    let scale = 10f64.powi(digits.min(20) as i32);
    let scaled = number * scale;
    let rounded = if scaled.is_finite() {
        scaled.round() / scale
    } else {
        number
    };
    format!("{rounded:.digits$}")
}

/// Epoch seconds in the local time zone.
pub fn format_timestamp(value: &Value, time_format: &str) -> String {
    format_timestamp_in(value, &Local, time_format)
}

pub fn format_timestamp_in<Tz>(value: &Value, tz: &Tz, time_format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(seconds) = finite_number(value) else {
        return PLACEHOLDER.to_string();
    };
    if seconds <= 0.0 {
        return PLACEHOLDER.to_string();
    }
    let millis = (seconds * 1000.0).trunc();
    if millis > MAX_EPOCH_MS {
        return PLACEHOLDER.to_string();
    }
    let Some(utc) = DateTime::from_timestamp_millis(millis as i64) else {
        return PLACEHOLDER.to_string();
    };
    let local = utc.with_timezone(tz);
    let mut out = String::new();
    match write!(out, "{}", local.format(time_format)) {
        Ok(()) => out,
        Err(_) => PLACEHOLDER.to_string(),
    }
}

/// 8-way compass glyph; empty when the bearing is not a number.
pub fn direction_arrow(value: &Value) -> &'static str {
    let Some(degrees) = finite_number(value) else {
        return "";
    };
    let idx = (degrees.rem_euclid(360.0) / 45.0).round() as usize % 8;
    ARROWS[idx]
}

pub fn source_badge(source: Option<&str>) -> String {
    match source {
        Some("BOTH") => "✅ FR24+ADS-B".to_string(),
        Some("FR24") => "⚠️ nur FR24".to_string(),
        Some("ADSB") => "⚠️ nur ADS-B".to_string(),
        Some(other) if !other.is_empty() => other.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Metric with unit suffix, e.g. `457 m`. Absent or unparsable values
/// render as the bare placeholder.
pub fn format_metric(value: Option<&Value>, digits: usize, unit: &str) -> String {
    match value.and_then(finite_number) {
        Some(number) => format!("{} {unit}", to_fixed(number, digits)),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn format_direction(value: Option<&Value>) -> String {
    match value {
        Some(raw) if finite_number(raw).is_some() => {
            format!("{}° {}", format_number(raw, 0), direction_arrow(raw))
        }
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    escape_html_into(&mut out, value);
    out
}

pub fn escape_html_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
