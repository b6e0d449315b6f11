//! Miner display names and logos, keyed by the upstream miner identifier.
//!
//! Two JSON object files map identifier to name and identifier to logo.
//! Load from: env `ERGO_DASH_MINER_NAMES` / `ERGO_DASH_MINER_LOGOS`, or
//! `./config/miner_names.json` / `./config/miner_logos.json`, or
//! `./miner_names.json` / `./miner_logos.json`.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

pub const UNKNOWN_MINER: &str = "Unknown";

const NAMES_ENV: &str = "ERGO_DASH_MINER_NAMES";
const LOGOS_ENV: &str = "ERGO_DASH_MINER_LOGOS";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MinerInfo {
    pub name: String,
    pub logo: Option<String>,
}

/// Read-only miner tables, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct MinerDirectory {
    names: HashMap<String, String>,
    logos: HashMap<String, String>,
}

/// Read a `{"id": "value"}` JSON file. Missing or malformed files give an empty map.
fn load_table(path: &Path) -> HashMap<String, String> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "miner table not readable; using empty mapping");
            return HashMap::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "miner table malformed; using empty mapping");
            HashMap::new()
        }
    }
}

fn resolve_path(env_key: &str, file_name: &str) -> Option<std::path::PathBuf> {
    if let Ok(path) = std::env::var(env_key) {
        return Some(path.into());
    }
    [Path::new("./config").join(file_name), Path::new(".").join(file_name)]
        .into_iter()
        .find(|p| p.exists())
}

fn resolve_table(explicit: Option<&Path>, env_key: &str, file_name: &str) -> HashMap<String, String> {
    if let Some(path) = explicit {
        return load_table(path);
    }
    match resolve_path(env_key, file_name) {
        Some(p) => load_table(&p),
        None => {
            warn!(file = file_name, "miner table not found; using empty mapping");
            HashMap::new()
        }
    }
}

impl MinerDirectory {
    pub fn new(names: HashMap<String, String>, logos: HashMap<String, String>) -> Self {
        Self { names, logos }
    }

    /// Load both tables from explicit paths.
    pub fn load_from_paths(names: &Path, logos: &Path) -> Self {
        Self::load_with(Some(names), Some(logos))
    }

    /// Load both tables from the environment or the default locations.
    pub fn load() -> Self {
        Self::load_with(None, None)
    }

    /// Load each table from its explicit path when given, otherwise from the
    /// environment or the default locations.
    pub fn load_with(names: Option<&Path>, logos: Option<&Path>) -> Self {
        let dir = Self::new(
            resolve_table(names, NAMES_ENV, "miner_names.json"),
            resolve_table(logos, LOGOS_ENV, "miner_logos.json"),
        );
        info!(names = dir.names.len(), logos = dir.logos.len(), "miner directory loaded");
        dir
    }

    fn unknown(&self) -> MinerInfo {
        MinerInfo {
            name: UNKNOWN_MINER.to_string(),
            logo: self.logos.get(UNKNOWN_MINER).cloned(),
        }
    }

    /// Display name and logo for a miner identifier. Empty or unmapped
    /// identifiers resolve to "Unknown" with the "Unknown" logo.
    pub fn lookup(&self, identifier: Option<&str>) -> MinerInfo {
        let Some(id) = identifier.filter(|s| !s.is_empty()) else {
            return self.unknown();
        };
        match self.names.get(id) {
            Some(name) => MinerInfo {
                name: name.clone(),
                logo: self.logos.get(id).cloned(),
            },
            None => self.unknown(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.logos.is_empty()
    }
}
