use std::net::SocketAddr;
use std::sync::Arc;

use marquee_api::{app, metrics::Metrics, state::{AppState, AuthConfig}, worker};
use marquee_booking::{ReservationPolicy, ReservationService};
use marquee_store::PgStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = marquee_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let db = marquee_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let store = Arc::new(PgStore::new(
        db.pool.clone(),
        config.business_rules.booking_prefix.clone(),
    ));

    let policy = ReservationPolicy {
        seat_lock_seconds: config.business_rules.seat_lock_seconds,
        hold_seconds: config.business_rules.hold_seconds,
        sweep_interval_seconds: config.business_rules.sweep_interval_seconds,
        booking_prefix: config.business_rules.booking_prefix.clone(),
    };
    let service = Arc::new(ReservationService::new(
        store.clone(),
        store.clone(),
        policy,
    ));

    worker::spawn_sweeper(store, config.business_rules.sweep_interval_seconds);

    let metrics = Arc::new(Metrics::new().expect("Failed to build metrics registry"));
    let app_state = AppState {
        service,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        metrics,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
