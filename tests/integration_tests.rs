// tests/integration_tests.rs

use air_traffic_card::format::PLACEHOLDER;
use air_traffic_card::icons::{IconTable, PLANE_ICON, TARGET_ICON};
use air_traffic_card::registry::{registered_cards, CARD_TYPE};
use air_traffic_card::view::{ChipKind, EMPTY_LIST_TEXT};
use air_traffic_card::{register_card, Card, CardPhase, IconLookup, RenderOutput, Snapshot};
use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::cell::Cell;
use std::fs;
use std::path::Path;

fn snapshot(flights: Value, status: Option<Value>) -> Snapshot {
    let mut states = json!({
        "sensor.air_traffic_merged": {
            "state": "3",
            "attributes": { "flights": flights, "last_update": 1_700_000_000 }
        }
    });
    if let Some(status) = status {
        states["sensor.air_traffic_status"] = status;
    }
    serde_json::from_value(json!({ "states": states })).expect("valid snapshot")
}

fn card_config() -> Value {
    json!({
        "entity": "sensor.air_traffic_merged",
        "status_entity": "sensor.air_traffic_status"
    })
}

fn rendered(card: &Card) -> &air_traffic_card::view::CardView {
    match card.output() {
        Some(RenderOutput::Card(view)) => view,
        other => panic!("expected a card, got {other:?}"),
    }
}

#[test]
fn nominal_snapshot_renders_card() {
    let mut card = Card::new(Some(&card_config())).unwrap();
    let flights = json!([
        { "hex": "4b1805", "callsign": "SWR12", "registration": "HB-JNA",
          "airline": "Swiss", "aircraft_model": "B77W", "source": "FR24",
          "alt_m": 10668, "spd_kmh": 870.4, "dist_km": 42.27, "dir_deg": 270 },
        { "hex": "3c4b26", "callsign": "CHX16", "registration": "D-HXAB",
          "tracked": true, "source": "BOTH", "dir_deg": 180 },
        { "hex": "440123", "source": "ADSB" }
    ]);
    let status = json!({
        "state": "both",
        "attributes": {
            "fr24_count": 2, "adsb_count": 2, "merged_count": 3,
            "tracking_enabled": true, "tracked_active_count": 1,
            "tracked_active": ["CHX16"]
        }
    });
    card.push_snapshot(&snapshot(flights, Some(status)));
    assert_eq!(card.phase(), CardPhase::Rendered);

    let view = rendered(&card);
    assert_eq!(view.title, "Flugzeuge");
    let idents: Vec<&str> = view.items.iter().map(|i| i.ident.as_str()).collect();
    assert_eq!(idents, vec!["CHX16", "SWR12", "HEX 440123"]);

    let chx = &view.items[0];
    assert_eq!(chx.icon, "🚑🚁");
    assert_eq!(chx.highlight.as_deref(), Some("CHX16"));
    assert_eq!(chx.direction, "180° ⬇️");

    let swiss = &view.items[1];
    assert_eq!(swiss.icon, PLANE_ICON);
    assert_eq!(swiss.altitude, "10668 m");
    assert_eq!(swiss.speed, "870 km/h");
    assert_eq!(swiss.distance, "42.3 km");
    assert_eq!(swiss.source_badge, "⚠️ nur FR24");

    let kinds: Vec<ChipKind> = view.chips.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChipKind::Fr24Count,
            ChipKind::AdsbCount,
            ChipKind::MergedCount,
            ChipKind::Status,
            ChipKind::Tracked
        ]
    );

    let html = card.render_html();
    assert!(html.contains("<ha-card>"));
    assert!(html.contains("✅ Beide Quellen"));
    assert!(html.contains("CHX16"));
}

#[test]
fn missing_status_entity_uses_fallbacks() {
    let mut card = Card::new(Some(&card_config())).unwrap();
    let flights = json!([{ "hex": "a" }, { "hex": "b", "tracked": true }]);
    card.push_snapshot(&snapshot(flights, None));
    let view = rendered(&card);
    assert_eq!(view.chips.len(), 3);
    assert_eq!(view.chips[0].value.as_deref(), Some(PLACEHOLDER));
    assert_eq!(view.chips[1].value.as_deref(), Some(PLACEHOLDER));
    assert_eq!(view.chips[2].value.as_deref(), Some("2"));
    assert_ne!(view.last_update, PLACEHOLDER);

    // The tracked summary comes from the status entity only; the tracked
    // flight keeps its per-item marker.
    assert!(view.chips.iter().all(|chip| chip.kind != ChipKind::Tracked));
    assert!(view.items[0].tracked);
    assert_eq!(view.items[0].title, "HEX: b");
    let html = card.render_html();
    assert!(html.contains("🎯 HEX: b"));
    assert!(!html.contains("🎯 Tracked"));
}

#[test]
fn empty_feed_shows_notice() {
    let mut card = Card::new(Some(&card_config())).unwrap();
    card.push_snapshot(&snapshot(json!([]), None));
    assert!(rendered(&card).items.is_empty());
    assert!(card.render_html().contains(EMPTY_LIST_TEXT));
}

#[test]
fn malformed_direction_only_blanks_direction() {
    let mut card = Card::new(Some(&card_config())).unwrap();
    let flights = json!([{ "hex": "a", "alt_m": 300, "dir_deg": "north" }]);
    card.push_snapshot(&snapshot(flights, None));
    let item = &rendered(&card).items[0];
    assert_eq!(item.direction, PLACEHOLDER);
    assert_eq!(item.altitude, "300 m");
}

#[test]
fn truncation_precedes_tracked_sort() {
    let mut config = card_config();
    config["max_items"] = json!(2);
    let mut card = Card::new(Some(&config)).unwrap();
    let flights = json!([
        { "hex": "a" },
        { "hex": "b", "tracked": true },
        { "hex": "c", "tracked": true }
    ]);
    card.push_snapshot(&snapshot(flights, None));
    let titles: Vec<&str> = rendered(&card).items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["HEX: b", "HEX: a"]);
}

#[test]
fn tracked_sort_is_stable() {
    let mut card = Card::new(Some(&card_config())).unwrap();
    let flights = json!([
        { "hex": "1" },
        { "hex": "2", "tracked": true },
        { "hex": "3" },
        { "hex": "4", "tracked": true },
        { "hex": "5" }
    ]);
    card.push_snapshot(&snapshot(flights.clone(), None));
    let order: Vec<String> = rendered(&card).items.iter().map(|i| i.title.clone()).collect();
    assert_eq!(order, vec!["HEX: 2", "HEX: 4", "HEX: 1", "HEX: 3", "HEX: 5"]);

    let mut config = card_config();
    config["prioritize_tracked"] = json!(false);
    card.set_config(Some(&config)).unwrap();
    card.push_snapshot(&snapshot(flights, None));
    let order: Vec<String> = rendered(&card).items.iter().map(|i| i.title.clone()).collect();
    assert_eq!(order, vec!["HEX: 1", "HEX: 2", "HEX: 3", "HEX: 4", "HEX: 5"]);
}

#[test]
fn same_snapshot_renders_identically() {
    let mut card = Card::new(Some(&card_config())).unwrap();
    let snap = snapshot(json!([{ "hex": "a", "callsign": "CHX16", "dir_deg": 45 }]), None);
    card.push_snapshot(&snap);
    let first = card.render_html();
    card.push_snapshot(&snap);
    assert_eq!(first, card.render_html());
}

struct FlakyLookup {
    fail: Cell<bool>,
}

impl IconLookup for FlakyLookup {
    fn lookup(&self, _table: IconTable, key: &str) -> Result<Option<String>> {
        if self.fail.replace(false) {
            return Err(anyhow!("icon table unavailable"));
        }
        Ok((key == "CHX16").then(|| "🚁".to_string()))
    }
}

#[test]
fn failed_render_recovers_on_next_snapshot() {
    let mut card = Card::new(Some(&card_config()))
        .unwrap()
        .with_icon_lookup(Box::new(FlakyLookup { fail: Cell::new(true) }));
    let snap = snapshot(json!([{ "callsign": "CHX16" }]), None);

    card.push_snapshot(&snap);
    assert_eq!(card.phase(), CardPhase::Failed);
    assert_eq!(card.last_error(), Some("icon table unavailable"));
    let html = card.render_html();
    assert!(html.contains("icon table unavailable"));
    assert!(!html.contains("class=\"item\""));

    card.push_snapshot(&snap);
    assert_eq!(card.phase(), CardPhase::Rendered);
    assert_eq!(rendered(&card).items[0].icon, "🚁");
}

#[test]
fn malformed_flight_entry_yields_diagnostic() {
    let mut card = Card::new(Some(&card_config())).unwrap();
    card.push_snapshot(&snapshot(json!([{ "hex": "a" }, "garbage"]), None));
    match card.output() {
        Some(RenderOutput::Diagnostic(panel)) => assert!(panel.message.contains("index 1")),
        other => panic!("expected diagnostic, got {other:?}"),
    }
}

#[test]
fn every_flight_gets_exactly_one_icon() {
    let mut config = card_config();
    config["tracked_icons"] = json!({});
    config["prioritize_tracked"] = json!(false);
    let mut card = Card::new(Some(&config)).unwrap();
    let flights = json!([
        { "hex": "a" },
        { "hex": "b", "tracked": true },
        { "hex": "c", "callsign": "CHX16" },
        { "hex": "d", "tracked": true, "tracked_by": "registration", "tracked_target": "d-hxab" }
    ]);
    card.push_snapshot(&snapshot(flights, None));
    let icons: Vec<&str> = rendered(&card).items.iter().map(|i| i.icon.as_str()).collect();
    assert_eq!(icons, vec![PLANE_ICON, TARGET_ICON, TARGET_ICON, TARGET_ICON]);
}

#[test]
fn registration_table_is_used_for_registration_tracking() {
    let mut config = card_config();
    config["tracked_icons_registration"] = json!({ "D-HXAB": "🚒" });
    let mut card = Card::new(Some(&config)).unwrap();
    let flights = json!([
        { "hex": "d", "tracked": true, "tracked_by": "registration", "tracked_target": "d-hxab" }
    ]);
    card.push_snapshot(&snapshot(flights, None));
    assert_eq!(rendered(&card).items[0].icon, "🚒");
}

#[test]
fn registration_is_idempotent() {
    register_card();
    register_card();
    let count = registered_cards()
        .iter()
        .filter(|card| card.card_type == CARD_TYPE)
        .count();
    assert_eq!(count, 1);
}

#[test]
fn invalid_configuration_is_rejected() {
    let err = Card::new(None).err().expect("missing config must fail");
    assert!(err.to_string().contains("You need to define an entity"));
    assert!(Card::new(Some(&json!({ "entity": "   " }))).is_err());
    assert!(Card::new(Some(&json!("sensor.air_traffic_merged"))).is_err());
}

#[test]
fn test_cargo_toml_metadata() {
    let cargo_content = fs::read_to_string("Cargo.toml").expect("Failed to read Cargo.toml");
    assert!(cargo_content.contains("name = \"air-traffic-card\""), "Missing package name");
    assert!(cargo_content.contains("description ="), "Missing description");
    assert!(cargo_content.contains("license ="), "Missing license");
    assert!(cargo_content.contains("readme ="), "Missing readme");
}

#[test]
fn test_readme_exists() {
    assert!(Path::new("README.md").exists());
}
