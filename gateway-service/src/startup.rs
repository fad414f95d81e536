//! Application startup and lifecycle management.
//!
//! Wires the upstream clients into shared state, builds the router with
//! the uniform endpoint contract, and runs the HTTP server alongside the
//! scheduled price-update worker.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::{
    cors::cors_contract_middleware, metrics::metrics_middleware, tracing::request_id_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::handlers;
use crate::services::cache::{PriceCache, RedisPriceCache};
use crate::services::market::MarketDataSource;
use crate::services::market::agmarknet::{AgmarknetConfig, AgmarknetSource};
use crate::services::providers::GenerativeProvider;
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::sync::{MongoSyncStore, SyncStore};
use crate::services::weather::WeatherProvider;
use crate::services::weather::open_weather::{OpenWeatherConfig, OpenWeatherProvider};
use crate::workers::PriceUpdateWorker;

/// Shared application state. Every handler gets its upstream clients from
/// here; nothing is reached through ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub generative: Arc<dyn GenerativeProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub market: Arc<dyn MarketDataSource>,
    pub price_cache: Arc<dyn PriceCache>,
    pub sync_store: Arc<dyn SyncStore>,
}

/// Health check endpoint for liveness probes.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.price_cache.health_check().await;
    let store = state.sync_store.health_check().await;

    match (&cache, &store) {
        (Ok(_), Ok(_)) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "gateway-service",
                "version": env!("CARGO_PKG_VERSION"),
                "checks": { "cache": "up", "store": "up" }
            })),
        ),
        _ => {
            if let Err(e) = &cache {
                tracing::error!(error = %e, "Cache health check failed");
            }
            if let Err(e) = &store {
                tracing::error!(error = %e, "Store health check failed");
            }
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "gateway-service",
                    "checks": {
                        "cache": if cache.is_ok() { "up" } else { "down" },
                        "store": if store.is_ok() { "up" } else { "down" },
                    }
                })),
            )
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/generateText",
            post(handlers::ai::generate_text).fallback(handlers::method_not_allowed),
        )
        .route(
            "/analyzeImage",
            post(handlers::ai::analyze_image).fallback(handlers::method_not_allowed),
        )
        .route(
            "/chat",
            post(handlers::ai::chat).fallback(handlers::method_not_allowed),
        )
        .route(
            "/getWeather",
            get(handlers::weather::get_weather).fallback(handlers::method_not_allowed),
        )
        .route(
            "/getMarketPrices",
            get(handlers::market::get_market_prices).fallback(handlers::method_not_allowed),
        )
        .route(
            "/syncData",
            post(handlers::sync::sync_data).fallback(handlers::method_not_allowed),
        )
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        // Outermost: answers preflight before anything else runs
        .layer(from_fn(cors_contract_middleware))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    worker_shutdown: CancellationToken,
    worker_handle: Option<JoinHandle<()>>,
}

impl Application {
    /// Build the application against the real upstream services.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let generative: Arc<dyn GenerativeProvider> = Arc::new(
            GeminiProvider::new(GeminiConfig {
                api_key: config.google.api_key.clone(),
                text_model: config.google.text_model.clone(),
                vision_model: config.google.vision_model.clone(),
                timeout: std::time::Duration::from_secs(config.google.timeout_seconds),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?,
        );
        tracing::info!(
            model = %config.google.text_model,
            "Initialized Gemini provider"
        );

        let weather: Arc<dyn WeatherProvider> = Arc::new(
            OpenWeatherProvider::new(OpenWeatherConfig {
                api_key: config.weather.api_key.clone(),
                base_url: config.weather.base_url.clone(),
                timeout: std::time::Duration::from_secs(config.weather.timeout_seconds),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?,
        );

        let market: Arc<dyn MarketDataSource> = Arc::new(
            AgmarknetSource::new(AgmarknetConfig {
                api_key: config.market.api_key.clone(),
                base_url: config.market.base_url.clone(),
                resource_id: config.market.resource_id.clone(),
                timeout: std::time::Duration::from_secs(config.market.timeout_seconds),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?,
        );

        let price_cache: Arc<dyn PriceCache> = Arc::new(
            RedisPriceCache::connect(&config.redis.url)
                .await
                .map_err(AppError::CacheError)?,
        );

        let sync_store_impl =
            MongoSyncStore::connect(&config.mongodb.uri, &config.mongodb.database).await?;
        sync_store_impl.initialize_indexes().await?;
        let sync_store: Arc<dyn SyncStore> = Arc::new(sync_store_impl);

        let state = AppState {
            config,
            generative,
            weather,
            market,
            price_cache,
            sync_store,
        };

        let mut app = Self::with_state(state.clone()).await?;

        // Scheduled refresh shares the request path's clients.
        let worker = PriceUpdateWorker::new(
            &state.config.schedule,
            state.config.market.cache_ttl_seconds,
            state.market.clone(),
            state.price_cache.clone(),
            app.worker_shutdown.clone(),
        )?;
        app.worker_handle = Some(worker.spawn());

        Ok(app)
    }

    /// Bind the listener and build the router for the given state, without
    /// starting the scheduled worker. Used directly by tests with mock
    /// upstreams.
    pub async fn with_state(state: AppState) -> Result<Self, AppError> {
        // port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Gateway service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
            worker_shutdown: CancellationToken::new(),
            worker_handle: None,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(mut self) -> std::io::Result<()> {
        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        // The worker stops with the server.
        self.worker_shutdown.cancel();
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.await;
        }

        if let Err(e) = &result {
            tracing::error!("HTTP server error: {}", e);
        }
        result
    }
}
