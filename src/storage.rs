use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::model::Snapshot;

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Many(Vec<Snapshot>),
    One(Snapshot),
}

/// Reads one snapshot, or an array of snapshots pushed in file order.
pub fn load_snapshots(path: &Path) -> Result<Vec<Snapshot>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshots: {}", path.display()))?;
    parse_snapshots(&content)
        .with_context(|| format!("Failed to parse snapshots: {}", path.display()))
}

pub fn parse_snapshots(content: &str) -> Result<Vec<Snapshot>> {
    let file: SnapshotFile = serde_json::from_str(content)?;
    Ok(match file {
        SnapshotFile::Many(snapshots) => snapshots,
        SnapshotFile::One(snapshot) => vec![snapshot],
    })
}

/// Writes to `path`, or to stdout when `path` is empty.
pub fn write_output(path: &str, content: &str) -> Result<()> {
    let path = path.trim();
    if path.is_empty() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
