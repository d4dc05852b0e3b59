//! coachsync-gateway server entry point.
//!
//! Starts the Axum HTTP server: payment webhook, reschedule, sync, and
//! cleanup endpoints backed by PostgreSQL and Google Calendar.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use coachsync_gateway::api;
use coachsync_gateway::app_state::AppState;
use coachsync_gateway::calendar::{CalendarProvider, GoogleCalendar};
use coachsync_gateway::config::GatewayConfig;
use coachsync_gateway::domain::NotificationBus;
use coachsync_gateway::persistence::{LedgerStore, PostgresLedger};
use coachsync_gateway::service::{
    CleanupService, CreditingService, ReconciliationService, RescheduleService,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Arc::new(GatewayConfig::from_env()?);
    tracing::info!(addr = %config.listen_addr, "starting coachsync-gateway");

    // Connect to PostgreSQL and run migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Build the ledger, calendar gateway, and services
    let store: Arc<dyn LedgerStore> = Arc::new(PostgresLedger::new(pool));
    let calendar: Arc<dyn CalendarProvider> = Arc::new(GoogleCalendar::new(&config));
    let notifier = NotificationBus::new(config.notification_capacity);

    let crediting = Arc::new(CreditingService::new(Arc::clone(&store), notifier.clone()));
    let reconciliation = Arc::new(ReconciliationService::new(
        Arc::clone(&store),
        Arc::clone(&calendar),
    ));
    let cleanup = Arc::new(CleanupService::new(
        Arc::clone(&store),
        Arc::clone(&calendar),
    ));
    let reschedule = Arc::new(RescheduleService::new(
        Arc::clone(&store),
        Arc::clone(&reconciliation),
        notifier.clone(),
    ));

    // Log notifications until a delivery channel is wired up
    let mut receiver = notifier.subscribe();
    tokio::spawn(async move {
        while let Ok(notification) = receiver.recv().await {
            tracing::info!(?notification, "notification");
        }
    });

    let app_state = AppState {
        config: Arc::clone(&config),
        store,
        crediting,
        reconciliation,
        cleanup,
        reschedule,
        notifier,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
