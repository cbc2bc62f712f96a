use std::sync::Arc;

use registrar::bot::Bot;
use registrar::channels::{ChannelManager, CliChannel, TelegramChannel};
use registrar::config::Config;
use registrar::store::{LibSqlBackend, UserStore};
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    eprintln!("📋 Registrar v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Page size: {}", config.page_size);

    // ── Database ─────────────────────────────────────────────────────
    let store: Arc<dyn UserStore> = Arc::new(
        LibSqlBackend::open(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {}",
                    config.db_path.display(),
                    e
                );
                std::process::exit(1);
            }),
    );

    // ── Bootstrap admin ──────────────────────────────────────────────
    // Promotion requires an existing admin, so the first one is flagged
    // here from the environment.
    if let Some(admin_id) = config.bootstrap_admin {
        match store.find_by_telegram_id(admin_id).await {
            Ok(Some(user)) if user.is_admin => {
                eprintln!("   Bootstrap admin: {} (already an admin)", admin_id);
            }
            Ok(Some(mut user)) => {
                user.is_admin = true;
                match store.update(&user).await {
                    Ok(()) => eprintln!("   Bootstrap admin: {} flagged", admin_id),
                    Err(e) => eprintln!(
                        "   Warning: Could not flag bootstrap admin {}: {}",
                        admin_id, e
                    ),
                }
            }
            Ok(None) => {
                eprintln!(
                    "   Bootstrap admin: {} is not registered yet; flag it after /start",
                    admin_id
                );
            }
            Err(e) => {
                eprintln!(
                    "   Warning: Could not look up bootstrap admin {}: {}",
                    admin_id, e
                );
            }
        }
    }

    // Set up channels
    let mut channels = ChannelManager::new();
    let mut active_channels = vec!["cli"];

    // Always add CLI
    channels.add(Box::new(CliChannel::new()));

    // Conditionally add Telegram if bot token is set
    if let Some(token) = &config.telegram_bot_token {
        channels.add(Box::new(TelegramChannel::new(
            token.expose_secret().to_string(),
        )));
        active_channels.push("telegram");
        eprintln!("   Telegram: enabled");
    }

    eprintln!("   Channels: {}", active_channels.join(", "));
    eprintln!("   Type /start to begin. Ctrl+C to exit.\n");

    let bot = Bot::new(config, store, channels);
    bot.run().await?;

    Ok(())
}
