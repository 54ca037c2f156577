use serde::Serialize;
use std::sync::{Mutex, OnceLock};
use tracing::{debug, info};

pub const CARD_TYPE: &str = "air-traffic-merge-card";
pub const CARD_NAME: &str = "Air Traffic Merge Card";
pub const CARD_DESCRIPTION: &str = "Merged FR24 + ADS-B flight list (with CHX highlight).";

/// Entry in the host's card catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardDescriptor {
    #[serde(rename = "type")]
    pub card_type: String,
    pub name: String,
    pub description: String,
}

impl CardDescriptor {
    pub fn air_traffic() -> Self {
        CardDescriptor {
            card_type: CARD_TYPE.to_string(),
            name: CARD_NAME.to_string(),
            description: CARD_DESCRIPTION.to_string(),
        }
    }
}

fn catalog() -> &'static Mutex<Vec<CardDescriptor>> {
    static CATALOG: OnceLock<Mutex<Vec<CardDescriptor>>> = OnceLock::new();
    CATALOG.get_or_init(|| Mutex::new(Vec::new()))
}

/// Adds `descriptor` to the process-wide catalog unless its type is already
/// present. Returns whether it was added.
pub fn register(descriptor: CardDescriptor) -> bool {
    let mut cards = catalog().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if cards.iter().any(|card| card.card_type == descriptor.card_type) {
        debug!(card_type = %descriptor.card_type, "card already registered");
        return false;
    }
    info!(card_type = %descriptor.card_type, "registering card");
    cards.push(descriptor);
    true
}

pub fn register_card() -> bool {
    register(CardDescriptor::air_traffic())
}

pub fn registered_cards() -> Vec<CardDescriptor> {
    catalog()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
