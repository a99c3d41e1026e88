//! German postal code directory.
//!
//! A compact dataset is compiled into the binary. Deployments that need full coverage point
//! `ZIPCODE_DATASET` at a JSON file with the same row layout.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

static EMBEDDED_ROWS: &str = include_str!("../../../data/zipcodes_de.json");

static EMBEDDED: Lazy<Arc<ZipcodeDirectory>> = Lazy::new(|| {
    let directory = ZipcodeDirectory::from_json(EMBEDDED_ROWS).unwrap_or_else(|e| {
        warn!(error = %e, "Embedded zipcode dataset is invalid");
        ZipcodeDirectory::default()
    });
    Arc::new(directory)
});

/// One row of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipcodeEntry {
    pub zipcode: String,
    pub city: String,
    #[serde(default)]
    pub city_addon: String,
    pub state: String,
}

#[derive(Debug, Clone, Default)]
pub struct ZipcodeDirectory {
    entries: Vec<ZipcodeEntry>,
}

/// Five-digit form of a postal code. Numeric input loses its leading zero (`1067`), so
/// shorter codes are left-padded.
pub fn normalize(raw: &str) -> Option<String> {
    let digits = raw.trim();
    if digits.is_empty() || digits.len() > 5 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{digits:0>5}"))
}

impl ZipcodeDirectory {
    /// The dataset compiled into the binary.
    pub fn embedded() -> Arc<Self> {
        Arc::clone(&EMBEDDED)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<ZipcodeEntry> = serde_json::from_str(raw)?;
        Ok(Self { entries })
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read zipcode dataset {}: {e}", path.display()))?;
        let directory = Self::from_json(&raw)
            .map_err(|e| format!("Failed to parse zipcode dataset {}: {e}", path.display()))?;
        info!(path = %path.display(), rows = directory.len(), "Loaded zipcode dataset");
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First row for the postal code. Several places can share one code.
    pub fn lookup(&self, zipcode: &str) -> Option<&ZipcodeEntry> {
        let zipcode = normalize(zipcode)?;
        self.entries.iter().find(|entry| entry.zipcode == zipcode)
    }
}
