use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::{AppConfig, StoreBackend, UploadConfig},
    database,
    error::{AppError, Result},
    routes,
    store::{MemoryProductStore, PgProductStore, ProductStore},
};

/// Application context shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub uploads: UploadConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn ProductStore>, uploads: UploadConfig) -> Self {
        Self { store, uploads }
    }
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let store: Arc<dyn ProductStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = database::create_pool(&config.database).await?;
            Arc::new(PgProductStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory product store; data is lost on restart");
            Arc::new(MemoryProductStore::new())
        }
    };

    tokio::fs::create_dir_all(&config.uploads.dir).await?;
    tracing::info!("Storing uploads in {}", config.uploads.dir.display());

    let state = AppState::new(store, config.uploads.clone());
    let mut app = router(state).layer(DefaultBodyLimit::max(config.server.max_body_size));

    if !config.cors.allowed_origins.is_empty() {
        let allowed_origins: Vec<HeaderValue> = config
            .cors
            .allowed_origins
            .iter()
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|_| {
                    AppError::ConfigError(format!("Invalid CORS origin: {}", origin))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([http::header::CONTENT_TYPE])
            .allow_origin(allowed_origins);

        app = app.layer(cors);
    }

    Ok(app)
}

/// Routes, static image serving and request logging over `state`.
pub fn router(state: AppState) -> Router {
    let images = ServeDir::new(&state.uploads.dir);

    routes::create_router(&state)
        .nest_service("/images", images)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
