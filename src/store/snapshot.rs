//! JSON snapshot persistence for the in-memory store

use crate::error::LedgerError;
use crate::types::{Match, RatingObservation, User};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Full serialisable contents of a ledger store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    /// Matches in insertion order
    pub matches: Vec<Match>,
    /// Observations in append order
    pub observations: Vec<RatingObservation>,
    pub next_sequence: u64,
}

/// Read a snapshot, returning `None` when the file does not exist yet
pub fn load_snapshot(path: &Path) -> Result<Option<LedgerSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot: LedgerSnapshot = serde_json::from_str(&raw).map_err(|e| LedgerError::Storage {
        message: format!("Invalid snapshot {}: {}", path.display(), e),
    })?;

    info!(
        "Loaded snapshot {}: {} users, {} matches, {} observations",
        path.display(),
        snapshot.users.len(),
        snapshot.matches.len(),
        snapshot.observations.len()
    );
    Ok(Some(snapshot))
}

/// Write a snapshot via a temporary file and rename, so readers never see a partial file
pub fn save_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialise snapshot")?;

    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_path);

    {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create {}", tmp_path.display()))?;
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to sync {}", tmp_path.display()))?;
    }

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to move snapshot into place at {}", path.display()))?;

    info!("Saved snapshot {}", path.display());
    Ok(())
}
