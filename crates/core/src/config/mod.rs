mod guild_data;
mod loader;
mod types;
mod validate;

pub use guild_data::{load_or_init_guild_data, GuildData};
pub use loader::{config_path_from_env, load_config, load_config_from_str, CONFIG_PATH_ENV};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Guild data error: {0}")]
    GuildData(String),
}
