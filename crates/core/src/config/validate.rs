use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Discord token is set
/// - Rate limit and window are positive
/// - A public key is present when interactions are verified
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.discord.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "discord.token cannot be empty".to_string(),
        ));
    }

    if config.rate_limit.limit == 0 {
        return Err(ConfigError::ValidationError(
            "rate_limit.limit cannot be 0".to_string(),
        ));
    }

    if config.rate_limit.window_secs == 0 {
        return Err(ConfigError::ValidationError(
            "rate_limit.window_secs cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::Ed25519
        && config
            .auth
            .public_key
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "auth.public_key is required for ed25519".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AuthConfig, DatabaseConfig, DiscordConfig, RateLimitConfig, ServerConfig, TicketConfig,
    };

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                public_key: None,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            discord: DiscordConfig {
                api_base: "https://discord.com/api/v10".to_string(),
                token: "abc".to_string(),
                timeout_secs: 30,
            },
            rate_limit: RateLimitConfig::default(),
            ticket: TicketConfig::default(),
        }
    }

    fn assert_invalid(config: &Config, needle: &str) {
        match validate_config(config) {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains(needle), "{}", msg),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        assert_invalid(&config, "server.port");
    }

    #[test]
    fn test_validate_empty_token_fails() {
        let mut config = valid_config();
        config.discord.token = "  ".to_string();
        assert_invalid(&config, "discord.token");
    }

    #[test]
    fn test_validate_rate_limit_bounds() {
        let mut config = valid_config();
        config.rate_limit.limit = 0;
        assert_invalid(&config, "rate_limit.limit");

        let mut config = valid_config();
        config.rate_limit.window_secs = 0;
        assert_invalid(&config, "rate_limit.window_secs");
    }

    #[test]
    fn test_validate_ed25519_requires_key() {
        let mut config = valid_config();
        config.auth.method = AuthMethod::Ed25519;
        assert_invalid(&config, "auth.public_key");

        config.auth.public_key = Some("ab".repeat(32));
        assert!(validate_config(&config).is_ok());
    }
}
