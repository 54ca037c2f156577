use anyhow::{anyhow, Result};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info};

use crate::card_config::CardConfig;
use crate::flights::build_items;
use crate::format::format_timestamp;
use crate::icons::IconLookup;
use crate::model::Snapshot;
use crate::status::project_status;
use crate::view::{CardView, DebugPanel, DiagnosticPanel, RenderOutput, FAILURE_HINT};

/// Layout height hint for the host, in rows.
pub const CARD_SIZE: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardPhase {
    /// No snapshot pushed yet; nothing is rendered.
    Idle,
    Rendering,
    Rendered,
    Failed,
}

/// The widget: holds the configuration and the last render, and turns every
/// pushed snapshot into a fresh output.
pub struct Card {
    config: CardConfig,
    icon_lookup: Option<Box<dyn IconLookup>>,
    phase: CardPhase,
    output: Option<RenderOutput>,
    last_error: Option<String>,
}

impl Card {
    pub fn new(raw_config: Option<&Value>) -> Result<Self> {
        Ok(Self::from_config(CardConfig::from_value(raw_config)?))
    }

    pub fn from_config(config: CardConfig) -> Self {
        Card {
            config,
            icon_lookup: None,
            phase: CardPhase::Idle,
            output: None,
            last_error: None,
        }
    }

    /// Routes icon lookups through `lookup` instead of the configured tables.
    pub fn with_icon_lookup(mut self, lookup: Box<dyn IconLookup>) -> Self {
        self.icon_lookup = Some(lookup);
        self
    }

    /// Replaces the configuration. An invalid configuration is rejected and
    /// the current one stays in place.
    pub fn set_config(&mut self, raw_config: Option<&Value>) -> Result<()> {
        let config = CardConfig::from_value(raw_config)?;
        info!(entity = %config.entity, "card configuration replaced");
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn phase(&self) -> CardPhase {
        self.phase
    }

    pub fn output(&self) -> Option<&RenderOutput> {
        self.output.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn card_size(&self) -> u32 {
        CARD_SIZE
    }

    /// Renders `snapshot` from scratch. Any failure replaces the whole card
    /// with a diagnostic panel; nothing from an earlier render survives.
    pub fn push_snapshot(&mut self, snapshot: &Snapshot) -> &RenderOutput {
        self.phase = CardPhase::Rendering;
        let icons: &dyn IconLookup = match &self.icon_lookup {
            Some(lookup) => lookup.as_ref(),
            None => &self.config.icons,
        };
        let config = &self.config;
        let composed = panic::catch_unwind(AssertUnwindSafe(|| compose(config, snapshot, icons)))
            .unwrap_or_else(|payload| {
                Err(anyhow!("render panicked: {}", panic_message(&*payload)))
            });
        let output = match composed {
            Ok(view) => {
                debug!(items = view.items.len(), "card rendered");
                self.phase = CardPhase::Rendered;
                self.last_error = None;
                RenderOutput::Card(view)
            }
            Err(err) => {
                let message = format!("{err:#}");
                error!(entity = %self.config.entity, "card render failed: {message}");
                self.phase = CardPhase::Failed;
                self.last_error = Some(message.clone());
                RenderOutput::Diagnostic(DiagnosticPanel {
                    title: self.config.title.clone(),
                    message,
                    hint: FAILURE_HINT.to_string(),
                })
            }
        };
        self.output.insert(output)
    }

    /// HTML for the current output; empty while idle.
    pub fn render_html(&self) -> String {
        self.output
            .as_ref()
            .map(RenderOutput::to_html)
            .unwrap_or_default()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Derives the full presentation for one snapshot.
pub fn compose(
    config: &CardConfig,
    snapshot: &Snapshot,
    icons: &dyn IconLookup,
) -> Result<CardView> {
    let merged = snapshot.entity(&config.entity);
    let status = config
        .status_entity
        .as_deref()
        .and_then(|id| snapshot.entity(id));
    let entries = merged.map(|entity| entity.flight_entries()).unwrap_or(&[]);

    let summary = project_status(status, merged, entries.len());
    let items = build_items(entries, config, icons)?;
    let last_update = format_timestamp(&summary.last_update, &config.time_format);

    let debug = config.show_debug.then(|| DebugPanel {
        merged_entity: config.entity.clone(),
        status_entity: config.status_entity.clone(),
        last_update: last_update.clone(),
        fr24_count: summary.fr24_count.clone(),
        adsb_count: summary.adsb_count.clone(),
        merged_count: summary.merged_count.clone(),
    });

    Ok(CardView {
        title: config.title.clone(),
        last_update,
        chips: summary.chips(),
        items,
        debug,
    })
}
