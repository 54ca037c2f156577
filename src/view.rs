//! Presentation document produced by a render, and its HTML form.

use serde::Serialize;
use std::fmt::Write;

use crate::format::{escape_html, escape_html_into};

const CSS: &str = r#"
  :host { display:block; }
  ha-card { overflow:hidden; }
  .wrap { padding: 12px 16px 16px; }
  .header { display:flex; align-items:flex-start; justify-content:space-between; gap:12px; }
  .title { font-weight: 600; font-size: 1.05rem; line-height: 1.2; }
  .sub { opacity: .8; font-size: .9rem; margin-top: 2px; }
  .chips { display:flex; flex-wrap:wrap; gap:8px; margin-top: 10px; }
  .chip { padding: 4px 10px; border-radius: 999px; background: var(--secondary-background-color); font-size: .85rem; }
  .list { margin-top: 12px; display:flex; flex-direction:column; gap:10px; }
  .item { padding: 10px 12px; border-radius: 12px; border: 1px solid var(--divider-color); }
  .itemHead { display:flex; align-items:center; justify-content:space-between; gap:10px; }
  .itemTitle { font-weight: 700; }
  .muted { opacity:.75; }
  .meta { margin-top: 4px; font-size: .92rem; }
  .kv { display:flex; flex-wrap:wrap; gap:10px; margin-top: 6px; font-size: .92rem; }
  .kv span { white-space: nowrap; }
  .code { font-family: var(--code-font-family, monospace); opacity:.85; }
  .error { color: var(--error-color, #db4437); }
  details { margin-top: 10px; }
  summary { cursor:pointer; }
"#;

pub const EMPTY_LIST_TEXT: &str = "Keine Flüge vorhanden.";
pub const FAILURE_HINT: &str =
    "Check that the flight entity exists and that every entry in its `flights` attribute is an object.";

/// Result of one render: the card itself or the diagnostic panel that
/// replaces it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderOutput {
    Card(CardView),
    Diagnostic(DiagnosticPanel),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardView {
    pub title: String,
    pub last_update: String,
    pub chips: Vec<Chip>,
    pub items: Vec<FlightItem>,
    pub debug: Option<DebugPanel>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipKind {
    Fr24Count,
    AdsbCount,
    MergedCount,
    Status,
    Tracked,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chip {
    pub kind: ChipKind,
    pub label: String,
    pub value: Option<String>,
    pub detail: Option<String>,
}

impl Chip {
    pub fn count(kind: ChipKind, label: &str, value: String) -> Self {
        Chip {
            kind,
            label: label.to_string(),
            value: Some(value),
            detail: None,
        }
    }
}

/// One rendered aircraft.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlightItem {
    pub icon: String,
    pub tracked: bool,
    /// Highlight callsign shown in bold ahead of the title.
    pub highlight: Option<String>,
    pub title: String,
    pub subline: Option<String>,
    pub source_badge: String,
    pub ident: String,
    pub altitude: String,
    pub speed: String,
    pub distance: String,
    pub direction: String,
    pub code_line: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DebugPanel {
    pub merged_entity: String,
    pub status_entity: Option<String>,
    pub last_update: String,
    pub fr24_count: String,
    pub adsb_count: String,
    pub merged_count: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DiagnosticPanel {
    pub title: String,
    pub message: String,
    pub hint: String,
}

impl RenderOutput {
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<style>");
        out.push_str(CSS);
        out.push_str("</style>\n<ha-card>\n<div class=\"wrap\">\n");
        match self {
            RenderOutput::Card(card) => write_card(&mut out, card),
            RenderOutput::Diagnostic(panel) => write_diagnostic(&mut out, panel),
        }
        out.push_str("</div>\n</ha-card>\n");
        out
    }
}

fn write_card(out: &mut String, card: &CardView) {
    let _ = writeln!(
        out,
        "<div class=\"header\"><div><div class=\"title\">{}</div><div class=\"sub\">📡 Letztes Update: <b>{}</b></div></div></div>",
        escape_html(&card.title),
        escape_html(&card.last_update)
    );

    out.push_str("<div class=\"chips\">");
    for chip in &card.chips {
        write_chip(out, chip);
    }
    out.push_str("</div>\n<div class=\"list\">");
    if card.items.is_empty() {
        let _ = write!(out, "<div class=\"muted\">{EMPTY_LIST_TEXT}</div>");
    }
    for item in &card.items {
        write_item(out, item);
    }
    out.push_str("</div>\n");

    if let Some(debug) = &card.debug {
        write_debug(out, debug);
    }
}

fn write_chip(out: &mut String, chip: &Chip) {
    out.push_str("<div class=\"chip\">");
    escape_html_into(out, &chip.label);
    if let Some(value) = &chip.value {
        out.push_str(": <b>");
        escape_html_into(out, value);
        out.push_str("</b>");
    }
    if let Some(detail) = &chip.detail {
        out.push_str(" (");
        escape_html_into(out, detail);
        out.push(')');
    }
    out.push_str("</div>");
}

fn write_item(out: &mut String, item: &FlightItem) {
    out.push_str("<div class=\"item\"><div class=\"itemHead\"><div><div class=\"itemTitle\">");
    escape_html_into(out, &item.icon);
    out.push(' ');
    if item.tracked {
        out.push_str("🎯 ");
    }
    if let Some(highlight) = &item.highlight {
        out.push_str("<b>");
        escape_html_into(out, highlight);
        out.push_str("</b> — ");
    }
    escape_html_into(out, &item.title);
    out.push_str("</div>");
    if let Some(subline) = &item.subline {
        out.push_str("<div class=\"muted\">");
        escape_html_into(out, subline);
        out.push_str("</div>");
    }
    let _ = write!(
        out,
        "</div><div class=\"chip\">{}</div></div>",
        escape_html(&item.source_badge)
    );
    let _ = write!(
        out,
        "<div class=\"meta\"><b>Kennung:</b> {}</div>",
        escape_html(&item.ident)
    );
    let _ = write!(
        out,
        "<div class=\"kv\"><span>🗼 {}</span><span>🚀 {}</span><span>📏 {}</span><span>🧭 {}</span></div>",
        escape_html(&item.altitude),
        escape_html(&item.speed),
        escape_html(&item.distance),
        escape_html(&item.direction)
    );
    if let Some(code) = &item.code_line {
        out.push_str("<div class=\"meta code\">");
        escape_html_into(out, code);
        out.push_str("</div>");
    }
    out.push_str("</div>\n");
}

fn write_debug(out: &mut String, debug: &DebugPanel) {
    out.push_str("<details><summary><b>🛠️ Debug</b></summary><div class=\"meta\">");
    let _ = write!(
        out,
        "<div><b>Merged entity:</b> <span class=\"code\">{}</span></div>",
        escape_html(&debug.merged_entity)
    );
    if let Some(status) = &debug.status_entity {
        let _ = write!(
            out,
            "<div><b>Status entity:</b> <span class=\"code\">{}</span></div>",
            escape_html(status)
        );
    }
    let _ = write!(
        out,
        "<div><b>Last update:</b> {}</div><div><b>Counts:</b> FR24 {} · ADS-B {} · Merged {}</div>",
        escape_html(&debug.last_update),
        escape_html(&debug.fr24_count),
        escape_html(&debug.adsb_count),
        escape_html(&debug.merged_count)
    );
    out.push_str("</div></details>\n");
}

fn write_diagnostic(out: &mut String, panel: &DiagnosticPanel) {
    let _ = writeln!(
        out,
        "<div class=\"title error\">⚠️ {}</div><div class=\"meta\">{}</div><div class=\"meta muted\">{}</div>",
        escape_html(&panel.title),
        escape_html(&panel.message),
        escape_html(&panel.hint)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> FlightItem {
        FlightItem {
            icon: "✈️".to_string(),
            tracked: false,
            highlight: None,
            title: "D-AIBL".to_string(),
            subline: None,
            source_badge: "✅ FR24+ADS-B".to_string(),
            ident: "DLH4AB".to_string(),
            altitude: "3200 m".to_string(),
            speed: "540 km/h".to_string(),
            distance: "18.2 km".to_string(),
            direction: "270° ⬅️".to_string(),
            code_line: None,
        }
    }

    fn card(items: Vec<FlightItem>) -> CardView {
        CardView {
            title: "Flugzeuge".to_string(),
            last_update: "—".to_string(),
            chips: vec![
                Chip::count(ChipKind::Fr24Count, "FR24", "3".to_string()),
                Chip {
                    kind: ChipKind::Tracked,
                    label: "🎯 Tracked".to_string(),
                    value: Some("1".to_string()),
                    detail: Some("CHX16".to_string()),
                },
            ],
            items,
            debug: None,
        }
    }

    #[test]
    fn empty_list_shows_notice() {
        let html = RenderOutput::Card(card(Vec::new())).to_html();
        assert!(html.contains(EMPTY_LIST_TEXT));
        assert!(html.contains("FR24: <b>3</b>"));
        assert!(html.contains("🎯 Tracked: <b>1</b> (CHX16)"));
    }

    #[test]
    fn item_markup() {
        let mut highlighted = item();
        highlighted.tracked = true;
        highlighted.highlight = Some("CHX16".to_string());
        highlighted.code_line = Some("H135 · 3c4b26".to_string());
        let html = RenderOutput::Card(card(vec![highlighted])).to_html();
        assert!(html.contains("✈️ 🎯 <b>CHX16</b> — D-AIBL"));
        assert!(html.contains("<b>Kennung:</b> DLH4AB"));
        assert!(html.contains("<span>🧭 270° ⬅️</span>"));
        assert!(html.contains("H135 · 3c4b26"));
        assert!(!html.contains(EMPTY_LIST_TEXT));
        assert!(!html.contains("<details>"));
    }

    #[test]
    fn text_is_escaped() {
        let mut nasty = item();
        nasty.title = "<script>".to_string();
        let html = RenderOutput::Card(card(vec![nasty])).to_html();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn debug_panel_markup() {
        let mut view = card(Vec::new());
        view.debug = Some(DebugPanel {
            merged_entity: "sensor.m".to_string(),
            status_entity: None,
            last_update: "—".to_string(),
            fr24_count: "—".to_string(),
            adsb_count: "—".to_string(),
            merged_count: "0".to_string(),
        });
        let html = RenderOutput::Card(view).to_html();
        assert!(html.contains("<span class=\"code\">sensor.m</span>"));
        assert!(!html.contains("Status entity"));
        assert!(html.contains("FR24 — · ADS-B — · Merged 0"));
    }

    #[test]
    fn diagnostic_markup() {
        let html = RenderOutput::Diagnostic(DiagnosticPanel {
            title: "Flugzeuge".to_string(),
            message: "boom".to_string(),
            hint: FAILURE_HINT.to_string(),
        })
        .to_html();
        assert!(html.contains("boom"));
        assert!(html.contains("flights"));
        assert!(!html.contains("class=\"list\""));
    }
}
