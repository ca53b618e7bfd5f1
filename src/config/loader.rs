//! Channel Loader
//!
//! Loads persisted channel records from JSON files and merges them by id.

use crate::config::channel::ChannelRecord;
use crate::error::{ResolverError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an extra channels file
pub const CHANNELS_PATH_ENV: &str = "CHANNEL_RESOLVER_PATH";

/// On-disk layout of a channels file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsFile {
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
}

/// Channel loader with support for multiple sources
pub struct ChannelLoader {
    channels: BTreeMap<String, ChannelRecord>,
}

impl ChannelLoader {
    /// Create a loader and read every default location that exists
    pub fn new() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut loader = Self::empty();
        for path in Self::get_config_paths() {
            if path.exists() {
                loader.load_from_file(&path)?;
            }
        }

        Ok(loader)
    }

    /// Create a loader from a single file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self::empty();
        loader.load_from_file(path)?;
        Ok(loader)
    }

    fn empty() -> Self {
        Self {
            channels: BTreeMap::new(),
        }
    }

    /// Get list of channel file paths to check, lowest precedence first
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".channel-resolver").join("channels.json"));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("channel-resolver").join("channels.json"));
        }

        paths.push(PathBuf::from("channels.json"));

        if let Ok(custom_path) = std::env::var(CHANNELS_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Load channel records from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ResolverError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let file: ChannelsFile = serde_json::from_str(&content).map_err(|e| {
            ResolverError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), count = file.channels.len(), "loaded channels file");
        self.merge(file);
        Ok(())
    }

    /// Merge records into this loader (later records override earlier ones by id)
    fn merge(&mut self, file: ChannelsFile) {
        for record in file.channels {
            self.channels.insert(record.id.clone(), record);
        }
    }

    /// Loaded records, ordered by id
    pub fn channels(&self) -> impl Iterator<Item = &ChannelRecord> {
        self.channels.values()
    }

    /// Take ownership of the records
    pub fn into_channels(self) -> Vec<ChannelRecord> {
        self.channels.into_values().collect()
    }
}

impl Default for ChannelLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::empty())
    }
}
