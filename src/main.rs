use anyhow::Result;

use air_traffic_card::config::{parse_args, OutputFormat};
use air_traffic_card::logging::init as init_logging;
use air_traffic_card::storage::{load_snapshots, write_output};
use air_traffic_card::{register_card, Card, CardPhase};
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config = parse_args()?;
    let _log_guard = init_logging(&config);
    info!("air-traffic-card starting");
    debug!("config path: {}", config.config_path.display());

    register_card();

    let mut card = Card::new(Some(&config.card))?;
    let snapshots = load_snapshots(&config.states_path)?;
    if snapshots.is_empty() {
        warn!("no snapshots in {}", config.states_path.display());
    }
    for (idx, snapshot) in snapshots.iter().enumerate() {
        card.push_snapshot(snapshot);
        debug!(snapshot = idx, phase = ?card.phase(), "snapshot pushed");
    }
    if card.phase() == CardPhase::Failed {
        warn!("last render failed: {}", card.last_error().unwrap_or_default());
    }

    let rendered = match config.format {
        OutputFormat::Html => card.render_html(),
        OutputFormat::Json => serde_json::to_string_pretty(&card.output())?,
    };
    write_output(&config.output, &rendered)?;

    info!("air-traffic-card exited");
    Ok(())
}
