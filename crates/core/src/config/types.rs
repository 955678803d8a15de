use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub discord: DiscordConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub ticket: TicketConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Interaction verification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Hex-encoded application public key (required for `ed25519`).
    #[serde(default)]
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Accept every request. Only for local testing.
    None,
    /// Verify the platform's Ed25519 request signature.
    Ed25519,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Ed25519 => "ed25519",
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ticketdesk.db")
}

/// Discord REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bot token
    pub token: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Rate limit applied to the `ticket` command
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Invocations allowed per window (default: 1)
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Window length in seconds (default: 180)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Whether invocations by members with "manage guild" still count (default: true)
    #[serde(default = "default_true")]
    pub bypass_records_usage: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
            bypass_records_usage: true,
        }
    }
}

fn default_limit() -> usize {
    1
}

fn default_window_secs() -> u64 {
    180
}

fn default_true() -> bool {
    true
}

/// Ticket presentation and placement
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TicketConfig {
    /// Author line of ticket messages
    #[serde(default = "default_brand")]
    pub brand: String,
    /// JSON file holding the guild and channel ids
    #[serde(default = "default_guild_data_path")]
    pub guild_data_path: PathBuf,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            guild_data_path: default_guild_data_path(),
        }
    }
}

fn default_brand() -> String {
    "Bug Ticket".to_string()
}

fn default_guild_data_path() -> PathBuf {
    PathBuf::from("data.json")
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub discord: SanitizedDiscordConfig,
    pub rate_limit: RateLimitConfig,
    pub ticket: TicketConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub public_key_configured: bool,
}

/// Sanitized Discord config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDiscordConfig {
    pub api_base: String,
    pub token_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                public_key_configured: config
                    .auth
                    .public_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            discord: SanitizedDiscordConfig {
                api_base: config.discord.api_base.clone(),
                token_configured: !config.discord.token.is_empty(),
                timeout_secs: config.discord.timeout_secs,
            },
            rate_limit: config.rate_limit.clone(),
            ticket: config.ticket.clone(),
        }
    }
}
