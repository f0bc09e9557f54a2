pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use store::{BookingStore, PgStore};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub config: config::Config,
}

impl AppState {
    /// Подключается к Postgres, накатывает миграции и собирает `PgStore`.
    pub async fn new(config: config::Config) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let db = database::Database::new(&config.database).await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;
        tracing::info!("Migrations applied");

        Ok(Self::with_store(Arc::new(PgStore::new(db)), config))
    }

    pub fn with_store(store: Arc<dyn BookingStore>, config: config::Config) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}

/// HTTP-приложение целиком: баннер, `/health` и маршруты `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.app.cors_allow_origin);

    Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(allow_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allow_origin == "*" {
        return layer.allow_origin(Any);
    }
    match allow_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!("ignoring invalid CORS_ALLOW_ORIGIN {:?}", allow_origin);
            layer
        }
    }
}
