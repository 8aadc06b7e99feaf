//! # Konkur Countdown Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database,
//! restores reminder rules, starts the reminder service, and runs the
//! Telegram bot alongside the health server.

use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use konkur_countdown_bot::bot::handlers::BotHandler;
use konkur_countdown_bot::bot::AppContext;
use konkur_countdown_bot::config::Config;
use konkur_countdown_bot::database::connection::DatabaseManager;
use konkur_countdown_bot::database::store::SqliteRuleStore;
use konkur_countdown_bot::exams::ExamCatalog;
use konkur_countdown_bot::services::countdown::CountdownEngine;
use konkur_countdown_bot::services::health::HealthService;
use konkur_countdown_bot::services::reminder::{ReminderService, TelegramNotifier};
use konkur_countdown_bot::services::scheduler::ReminderScheduler;
use konkur_countdown_bot::services::subscription::SubscriptionService;
use konkur_countdown_bot::utils::logging::log_system_event;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "konkur_countdown_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Konkur Countdown Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, Timezone: {}",
        config.database_url,
        config.http_port,
        config.timezone.name()
    );

    // Initialize database
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    // Exams, countdowns and reminder rules
    let catalog = Arc::new(ExamCatalog::konkur_1405()?);
    let engine = CountdownEngine::new(catalog.clone());
    let scheduler = Arc::new(ReminderScheduler::new(config.timezone, catalog));
    let store = Arc::new(SqliteRuleStore::new(db_arc.pool.clone()));
    let subscriptions = Arc::new(SubscriptionService::new(scheduler.clone(), store));
    let restored = subscriptions.restore().await?;
    log_system_event("rules_restored", Some(&format!("{restored} rules")));

    // Initialize bot
    let bot = Bot::new(&config.telegram_bot_token);
    let ctx = AppContext::new(db_arc.as_ref().clone(), engine.clone(), subscriptions);
    let handler = BotHandler::new(ctx);
    info!("Telegram bot initialized successfully");

    // Initialize and start reminder service
    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
    let mut reminder_service = match ReminderService::new(scheduler.clone(), engine, notifier).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to create reminder service: {}", e);
            return Err(anyhow::anyhow!("Failed to create reminder service: {}", e));
        }
    };

    if let Err(e) = reminder_service.start().await {
        tracing::error!("Failed to start reminder service: {}", e);
    } else {
        log_system_event("reminder_service_started", None);
    }

    // Initialize health service
    let health_service = HealthService::new(db_arc.clone(), scheduler);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Health check server starting on port {}", config.http_port);

    // Run both the bot and health server concurrently
    let bot_task = tokio::spawn(async move {
        let storage: Arc<InMemStorage<()>> = InMemStorage::new();
        Dispatcher::builder(bot, handler.schema())
            .dependencies(dptree::deps![storage])
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

    // Wait for either task to complete (which would indicate shutdown)
    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = reminder_service.stop().await {
        tracing::warn!("Error stopping reminder service: {}", e);
    }

    log_system_event("shutdown", None);
    Ok(())
}
