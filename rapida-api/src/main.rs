use std::net::SocketAddr;
use std::sync::Arc;

use rapida_api::{app, state::{AppState, AuthSettings}};
use rapida_booking::{ReservationService, SeatOccupancy};
use rapida_catalog::{AvailabilityTracker, TripCatalog};
use rapida_core::{ReservationStore, TripStore};
use rapida_store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rapida_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rapida_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Vía Rápida API on port {}", config.server.port);

    // Postgres connection + schema
    let store = PgStore::connect(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    store.migrate().await.expect("Failed to run migrations");

    let trip_store: Arc<dyn TripStore> = Arc::new(store.clone());
    let reservation_store: Arc<dyn ReservationStore> = Arc::new(store);

    let occupancy = Arc::new(SeatOccupancy::with_fail_open(
        reservation_store.clone(),
        config.booking_rules.occupancy_fail_open,
    ));

    let app_state = AppState {
        catalog: Arc::new(TripCatalog::new(trip_store.clone())),
        tracker: Arc::new(AvailabilityTracker::new(trip_store)),
        occupancy: occupancy.clone(),
        reservations: Arc::new(ReservationService::new(
            reservation_store,
            occupancy,
            config.booking_rules.clone(),
        )),
        auth: AuthSettings {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        rules: config.booking_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
