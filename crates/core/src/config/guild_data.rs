//! Guild and channel ids the desk operates in.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::platform::{ChannelId, GuildId};

use super::ConfigError;

/// Ids persisted in the guild data file (`data.json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildData {
    /// Guild the bot serves.
    pub main_guild: GuildId,
    /// Channel tickets are posted to.
    pub main_channel: ChannelId,
    /// Channel holding the tracking index.
    pub tracking_channel: ChannelId,
}

impl Default for GuildData {
    fn default() -> Self {
        Self {
            main_guild: 850912717107625984,
            main_channel: 1090320030094348389,
            tracking_channel: 1130863192332058675,
        }
    }
}

/// Read the guild data file, writing the defaults first if it is missing.
pub fn load_or_init_guild_data(path: &Path) -> Result<GuildData, ConfigError> {
    if !path.exists() {
        let data = GuildData::default();
        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| ConfigError::GuildData(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| ConfigError::GuildData(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Wrote default guild data");
        return Ok(data);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| ConfigError::GuildData(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| ConfigError::GuildData(format!("{}: {}", path.display(), e)))
}
