//! Dashboard card that renders a merged FR24 + ADS-B flight list.
//!
//! The host pushes state snapshots into a [`Card`]; each push runs the full
//! pipeline (status projection, flight selection, icon resolution,
//! formatting) and yields either the card or a diagnostic panel.

pub mod card;
pub mod card_config;
pub mod config;
pub mod flights;
pub mod format;
pub mod icons;
pub mod logging;
pub mod model;
pub mod registry;
pub mod status;
pub mod storage;
pub mod view;

pub use card::{Card, CardPhase};
pub use card_config::CardConfig;
pub use icons::{IconLookup, IconTable, IconTables};
pub use model::{EntityState, FlightRecord, Snapshot};
pub use registry::register_card;
pub use view::RenderOutput;
