use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::core::{error::GuardError, verdict::Verdict};

#[derive(Serialize, Deserialize, Clone, Debug)]
struct StoredEntry {
    verdict: Verdict,
    timestamp_ms: u128,
}

/// JSON-file verdict cache for runs that should survive process restarts.
/// Keyed by the fully-normalized URL.
pub struct DiskCache {
    path: std::path::PathBuf,
}

impl DiskCache {
    pub fn new(path: &Path) -> Result<Self, GuardError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GuardError::Config(e.to_string()))?;
        }
        if !path.exists() {
            fs::write(path, b"{}\n").map_err(|e| GuardError::Config(e.to_string()))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn get(&self, url: &str, ttl: Duration) -> Result<Option<Verdict>, GuardError> {
        let map = self.read_map()?;
        if let Some(entry) = map.get(url) {
            let age = now_ms().saturating_sub(entry.timestamp_ms);
            if age < ttl.as_millis() {
                return Ok(Some(entry.verdict.clone()));
            }
        }
        Ok(None)
    }

    pub fn put(&self, url: &str, verdict: &Verdict) -> Result<(), GuardError> {
        let mut map = self.read_map()?;
        map.insert(
            url.to_string(),
            StoredEntry {
                verdict: verdict.clone(),
                timestamp_ms: now_ms(),
            },
        );
        self.write_map(&map)
    }

    pub fn purge_expired(&self, ttl: Duration) -> Result<(), GuardError> {
        let mut map = self.read_map()?;
        let now = now_ms();
        map.retain(|_, entry| now.saturating_sub(entry.timestamp_ms) < ttl.as_millis());
        self.write_map(&map)
    }

    fn read_map(&self) -> Result<HashMap<String, StoredEntry>, GuardError> {
        let data =
            fs::read_to_string(&self.path).map_err(|e| GuardError::Config(e.to_string()))?;
        let map: HashMap<String, StoredEntry> = serde_json::from_str(&data).unwrap_or_default();
        Ok(map)
    }

    fn write_map(&self, map: &HashMap<String, StoredEntry>) -> Result<(), GuardError> {
        let json = serde_json::to_string_pretty(map).map_err(|_| GuardError::Unknown)?;
        fs::write(&self.path, json).map_err(|e| GuardError::Config(e.to_string()))
    }
}

fn now_ms() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
