//! glow-bot Server
//!
//! Wires the funnel together: Postgres ledger, Telegram gateway, payment
//! provider, webhook receiver and the long-poll dispatcher. All
//! collaborators are constructed here and injected; nothing reaches for
//! globals.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glow_core::ContentStore;
use glow_payments::{PaymentWorkflow, WorkflowConfig, YookassaClient};
use glow_server::{config::ServerConfig, dispatcher::Dispatcher, router, state::AppState};
use glow_store::PgStore;
use glow_telegram::TelegramBot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    // Message catalogue
    let content = Arc::new(ContentStore::load(&config.content_path)?);
    tracing::info!(path = %config.content_path, "✓ Content catalogue loaded");

    // Ledger store (runs migrations)
    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    tracing::info!("✓ Connected to Postgres");

    // Messaging gateway and payment provider
    let bot = Arc::new(TelegramBot::from_env()?);
    let provider = Arc::new(YookassaClient::from_env()?);
    tracing::info!("✓ Telegram and payment provider configured");

    // The payment-confirmation core
    let workflow = Arc::new(PaymentWorkflow::new(
        store.clone(),
        provider,
        bot.clone(),
        content.clone(),
        WorkflowConfig {
            return_url: config.return_url.clone(),
            access_link: config.access_link.clone(),
        },
    ));

    // Chat dispatcher
    let dispatcher = Arc::new(Dispatcher::new(
        bot,
        store.clone(),
        store.clone(),
        workflow.clone(),
        content,
    ));
    tokio::spawn(dispatcher.run());

    // Webhook server
    let app = router(AppState::new(workflow, config.webhook_secret.as_str()));
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 glow-bot running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  POST /webhook/payment - Provider webhook");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
