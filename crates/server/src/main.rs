use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketdesk_core::{
    config_path_from_env, create_authenticator, load_config, load_or_init_guild_data,
    validate_config, Authenticator, ChatPlatform, DeskSettings, DiscordClient, Notifier,
    PlatformNotifier, RateLimiter, SanitizedConfig, SqliteTicketStore, TicketDesk, TicketStore,
    TrackingIndex,
};
use ticketdesk_server::api::{create_router, CommandRegistry};
use ticketdesk_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = config_path_from_env();
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;
    info!(
        config = %serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default(),
        "Configuration loaded"
    );

    let guild_data = load_or_init_guild_data(&config.ticket.guild_data_path)
        .context("Failed to load guild data")?;
    info!(
        guild = guild_data.main_guild,
        ticket_channel = guild_data.main_channel,
        tracking_channel = guild_data.tracking_channel,
        "Guild data loaded"
    );

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let store: Arc<dyn TicketStore> = Arc::new(
        SqliteTicketStore::new(&config.database.path).context("Failed to open ticket store")?,
    );
    info!("Ticket store initialized at {:?}", config.database.path);

    let platform: Arc<dyn ChatPlatform> = Arc::new(
        DiscordClient::connect(config.discord.clone())
            .await
            .context("Failed to connect to Discord")?,
    );
    info!(bot_user_id = platform.bot_user_id(), "Connected to Discord");

    let tracking = Arc::new(TrackingIndex::new(
        Arc::clone(&platform),
        guild_data.tracking_channel,
    ));
    let notifier: Arc<dyn Notifier> = Arc::new(PlatformNotifier::new(Arc::clone(&platform)));
    let desk = Arc::new(TicketDesk::new(
        platform,
        store,
        tracking,
        notifier,
        DeskSettings {
            guild_id: guild_data.main_guild,
            ticket_channel_id: guild_data.main_channel,
            brand: config.ticket.brand.clone(),
        },
    ));

    // Rate limiting for ticket creation; moderators are let through
    let limiter = Arc::new(
        RateLimiter::new(
            config.rate_limit.limit,
            Duration::from_secs(config.rate_limit.window_secs),
        )
        .with_bypass(
            |actor| actor.can_manage_guild,
            config.rate_limit.bypass_records_usage,
        ),
    );
    limiter.spawn_pruner();

    let commands = CommandRegistry::with_ticket_command(Arc::clone(&limiter));

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        desk,
        commands,
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
