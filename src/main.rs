//! rental-gateway server entry point.
//!
//! Starts the Axum HTTP server with the booking REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rental_gateway::api;
use rental_gateway::app_state::AppState;
use rental_gateway::config::{LogFormat, ServiceConfig};
use rental_gateway::persistence::{
    self, BookingStore, MemoryBookingStore, MemoryVehicleCatalog, PgBookingStore,
    PgVehicleProvider, VehicleProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServiceConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting rental-gateway");

    // Build persistence layer
    let (bookings, vehicles) = build_backends(&config).await?;

    // Build application state
    let app_state = AppState::new(bookings, vehicles, config.pricing);
    let policy = app_state.booking_service.pricing_policy();
    tracing::info!(
        service_fee_rate = %policy.service_fee_rate(),
        tax_rate = %policy.tax_rate(),
        "pricing policy loaded"
    );

    // Build router
    let app = router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                )))
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

#[cfg(feature = "swagger-ui")]
fn router() -> Router<AppState> {
    api::build_router_with_docs()
}

#[cfg(not(feature = "swagger-ui"))]
fn router() -> Router<AppState> {
    api::build_router()
}

async fn build_backends(
    config: &ServiceConfig,
) -> Result<(Arc<dyn BookingStore>, Arc<dyn VehicleProvider>), Box<dyn std::error::Error>> {
    if config.persistence_enabled {
        let pool = persistence::postgres::connect(config).await?;
        return Ok((
            Arc::new(PgBookingStore::new(pool.clone())),
            Arc::new(PgVehicleProvider::new(pool)),
        ));
    }

    tracing::warn!("persistence disabled, bookings are kept in memory");
    let catalog = match &config.vehicle_seed_path {
        Some(path) => MemoryVehicleCatalog::from_seed_file(path).await?,
        None => MemoryVehicleCatalog::new(),
    };
    Ok((Arc::new(MemoryBookingStore::new()), Arc::new(catalog)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
