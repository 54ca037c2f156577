use serde_json::Value;

use crate::format::PLACEHOLDER;
use crate::model::{scalar_text, EntityState};
use crate::view::{Chip, ChipKind};

/// Overall feed health reported by the status entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedStatus {
    NoData,
    AdsbOnly,
    Fr24Only,
    Both,
}

impl FeedStatus {
    pub fn from_state(state: &str) -> Option<Self> {
        match state {
            "none" => Some(FeedStatus::NoData),
            "adsb_only" => Some(FeedStatus::AdsbOnly),
            "fr24_only" => Some(FeedStatus::Fr24Only),
            "both" => Some(FeedStatus::Both),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeedStatus::NoData => "⚠️ Keine Daten",
            FeedStatus::AdsbOnly => "⚠️ Nur ADS-B",
            FeedStatus::Fr24Only => "⚠️ Nur FR24",
            FeedStatus::Both => "✅ Beide Quellen",
        }
    }
}

/// Aggregate badges derived from the status entity, with fallbacks for
/// when it is not configured or not present.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusSummary {
    pub last_update: Value,
    pub fr24_count: String,
    pub adsb_count: String,
    pub merged_count: String,
    pub status: Option<FeedStatus>,
    pub tracking_enabled: bool,
    pub tracked_active_count: i64,
    pub tracked_active: Vec<String>,
}

impl StatusSummary {
    /// Shown when tracking is on or anything is being tracked right now.
    pub fn show_tracked(&self) -> bool {
        self.tracking_enabled || self.tracked_active_count > 0
    }

    pub fn chips(&self) -> Vec<Chip> {
        let mut chips = vec![
            Chip::count(ChipKind::Fr24Count, "FR24", self.fr24_count.clone()),
            Chip::count(ChipKind::AdsbCount, "ADS-B", self.adsb_count.clone()),
            Chip::count(ChipKind::MergedCount, "Zusammengeführt", self.merged_count.clone()),
        ];
        if let Some(status) = self.status {
            chips.push(Chip {
                kind: ChipKind::Status,
                label: status.label().to_string(),
                value: None,
                detail: None,
            });
        }
        if self.show_tracked() {
            let detail = (self.tracked_active_count > 0).then(|| self.tracked_active.join(", "));
            chips.push(Chip {
                kind: ChipKind::Tracked,
                label: "🎯 Tracked".to_string(),
                value: Some(self.tracked_active_count.to_string()),
                detail,
            });
        }
        chips
    }
}

/// `flight_count` is the size of the full merged feed and backs the merged
/// count when the status entity does not report one.
pub fn project_status(
    status: Option<&EntityState>,
    merged: Option<&EntityState>,
    flight_count: usize,
) -> StatusSummary {
    let fields = status.map(EntityState::status_fields).unwrap_or_default();
    let last_update = fields
        .last_update
        .clone()
        .or_else(|| merged.and_then(|entity| entity.attr("last_update")).cloned())
        .unwrap_or(Value::from(0));

    StatusSummary {
        last_update,
        fr24_count: count_text(fields.fr24_count.as_ref()),
        adsb_count: count_text(fields.adsb_count.as_ref()),
        merged_count: fields
            .merged_count
            .as_ref()
            .and_then(scalar_text)
            .unwrap_or_else(|| flight_count.to_string()),
        status: status.and_then(|entity| FeedStatus::from_state(&entity.state)),
        tracking_enabled: fields.tracking_enabled.unwrap_or(false),
        tracked_active_count: fields.tracked_active_count.unwrap_or(0),
        tracked_active: fields.tracked_active.unwrap_or_default(),
    }
}

fn count_text(value: Option<&Value>) -> String {
    value
        .and_then(scalar_text)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
