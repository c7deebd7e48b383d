use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::handlers::AppointmentState;
use appointment_cell::services::supabase_store::SupabaseAppointmentStore;
use appointment_cell::{AppointmentBookingService, AppointmentStore, InMemoryAppointmentStore};
use doctor_cell::{DirectoryLookup, InMemoryDirectory, SupabaseDirectory};
use notification_cell::handlers::NotificationState;
use notification_cell::{InMemoryAcknowledgedStore, NotificationPoller, PollerRegistry};
use shared_config::{AppConfig, StorageBackend};
use shared_utils::clock::SystemClock;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic appointments API server");

    // Load configuration
    let config = AppConfig::from_env();

    // Storage backends
    let (directory, store): (Arc<dyn DirectoryLookup>, Arc<dyn AppointmentStore>) = match config.storage_backend {
        StorageBackend::Supabase => {
            info!("Using Supabase storage at {}", config.supabase_url);
            (
                Arc::new(SupabaseDirectory::new(&config)),
                Arc::new(SupabaseAppointmentStore::new(&config)),
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            (
                Arc::new(InMemoryDirectory::seeded()),
                Arc::new(InMemoryAppointmentStore::new()),
            )
        }
    };

    // Services
    let booking = Arc::new(AppointmentBookingService::new(
        store,
        Arc::clone(&directory),
        Arc::new(SystemClock),
    ));
    let poller = NotificationPoller::new(
        booking.clone(),
        Arc::new(InMemoryAcknowledgedStore::new()),
        config.poll_interval(),
    );
    let registry = Arc::new(PollerRegistry::new(poller));

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(
        directory,
        AppointmentState::new(booking),
        NotificationState::new(registry.clone()),
    )
    .layer(
        TraceLayer::new_for_http()
            .make_span_with(trace::DefaultMakeSpan::new()
                .level(Level::INFO))
            .on_response(trace::DefaultOnResponse::new()
                .level(Level::INFO)),
    )
    .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    registry.shutdown().await;
    info!("Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
