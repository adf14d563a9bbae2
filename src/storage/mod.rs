//! Persistence layer.
//!
//! Saves and loads a snapshot of the book (stable, races and bettor
//! accounts) as a pretty-printed JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::racing::race::Race;
use crate::types::{Horse, Jockey};
use crate::wagering::ledger::Bettor;

/// Default snapshot file path.
pub const DEFAULT_SNAPSHOT_FILE: &str = "turf_book.json";

/// Everything the book owns, in a serialisable shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub horses: Vec<Horse>,
    pub jockeys: Vec<Jockey>,
    pub races: Vec<Race>,
    pub bettors: Vec<Bettor>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.horses.is_empty() && self.jockeys.is_empty() && self.races.is_empty() && self.bettors.is_empty()
    }
}

/// Save a snapshot to a JSON file.
pub fn save_snapshot(snapshot: &Snapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialise book snapshot")?;

    std::fs::write(path, &json).context(format!("Failed to write snapshot to {path}"))?;

    debug!(
        path,
        races = snapshot.races.len(),
        bettors = snapshot.bettors.len(),
        "Snapshot saved"
    );
    Ok(())
}

/// Load a snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh book).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<Snapshot>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).context(format!("Failed to read snapshot from {path}"))?;
    let snapshot: Snapshot =
        serde_json::from_str(&json).context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        horses = snapshot.horses.len(),
        jockeys = snapshot.jockeys.len(),
        races = snapshot.races.len(),
        bettors = snapshot.bettors.len(),
        "Snapshot loaded from disk"
    );
    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
