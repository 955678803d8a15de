pub mod auth;
pub mod command;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod platform;
pub mod ratelimit;
pub mod testing;
pub mod ticket;
pub mod tracking;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Ed25519Authenticator,
    NoneAuthenticator,
};
pub use command::{CommandHandler, CommandInvocation};
pub use config::{
    config_path_from_env, load_config, load_config_from_str, load_or_init_guild_data,
    validate_config, AuthMethod, Config, ConfigError, GuildData, SanitizedConfig,
};
pub use notify::{Notification, Notifier, NotifyError, PlatformNotifier};
pub use platform::{Actor, ChatPlatform, DiscordClient, InteractionReply, PlatformError};
pub use ratelimit::{rate_limited_embed, Decision, RateLimitGuard, RateLimiter};
pub use ticket::{
    DeskSettings, SqliteTicketStore, TicketDesk, TicketError, TicketFilter, TicketId,
    TicketRecord, TicketStatus, TicketStore, TransitionKind, TransitionOutcome,
};
pub use tracking::{TrackingEntry, TrackingError, TrackingIndex};
