//! # Plan Reminder Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database,
//! starts the reminder service and the health server, and runs the
//! Telegram bot until Ctrl-C.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plan_reminder_bot::bot::commands::Command;
use plan_reminder_bot::bot::dialog::DialogController;
use plan_reminder_bot::bot::handlers::BotHandler;
use plan_reminder_bot::bot::state::ConversationStore;
use plan_reminder_bot::bot::transport::TelegramTransport;
use plan_reminder_bot::config::Config;
use plan_reminder_bot::database::connection::DatabaseManager;
use plan_reminder_bot::services::health::HealthService;
use plan_reminder_bot::services::image::HttpImageSource;
use plan_reminder_bot::services::reminder::{ReminderDispatcher, ReminderService};
use plan_reminder_bot::utils::logging::log_system_event;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plan_reminder_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Plan Reminder Bot v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded - Database: {}, HTTP Port: {}, Reminder schedule: {}",
        config.database_url, config.http_port, config.reminder_cron);

    // Initialize database
    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    // Initialize bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let me = bot.get_me().await?;
    let bot_username = me.username().to_string();
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!("Failed to publish command list: {}", e);
    }

    let store = Arc::new(ConversationStore::new());
    let controller = Arc::new(
        DialogController::new(db_arc.clone(), store).with_bot_username(bot_username.clone()),
    );
    let handler = BotHandler::new(controller, &bot_username);
    info!("Telegram bot @{} initialized successfully", bot_username);

    // Initialize and start reminder service
    info!("Initializing reminder service...");
    let dispatcher = Arc::new(ReminderDispatcher::new(
        db_arc.clone(),
        Arc::new(TelegramTransport::new(bot.clone())),
        Arc::new(HttpImageSource::new(config.reminder_image_url.clone())),
    ));
    let mut reminder_service = match ReminderService::new(dispatcher, &config.reminder_cron).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create reminder service: {}", e);
            return Err(anyhow::anyhow!("Failed to create reminder service: {}", e));
        }
    };

    if let Err(e) = reminder_service.start().await {
        tracing::error!("Failed to start reminder service: {}", e);
        return Err(anyhow::anyhow!("Failed to start reminder service: {}", e));
    }

    // Initialize health service
    let health_service = HealthService::new(db_arc.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    // Run both the bot and health server concurrently
    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    log_system_event("running", Some("press Ctrl-C to stop"));

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result1 = bot_task => {
            if let Err(e) = result1 {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result2 = health_task => {
            if let Err(e) = result2 {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    // Stop reminder service on shutdown
    if let Err(e) = reminder_service.stop().await {
        tracing::warn!("Error stopping reminder service: {}", e);
    }

    log_system_event("stopped", None);
    Ok(())
}
