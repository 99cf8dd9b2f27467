use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod services;
mod store;

use config::Config;
use services::insight::InsightService;
use store::{LocalTier, RecordStore, RemoteBackend};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub insights: Arc<InsightService>,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    let records = Router::new()
        .route("/api/records", get(handlers::records::list_records))
        .route(
            "/api/records/:date",
            get(handlers::records::get_record)
                .put(handlers::records::put_record)
                .patch(handlers::records::patch_record)
                .delete(handlers::records::clear_record),
        );

    let stats = Router::new()
        .route("/api/stats/summary", get(handlers::stats::get_summary))
        .route("/api/stats/chart", get(handlers::stats::get_chart))
        .route("/api/stats/calendar", get(handlers::stats::get_calendar));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/api/insights/:date", get(handlers::insights::get_insight))
        .merge(records)
        .merge(stats)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habitflow_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Remote mirror is optional; any setup failure means local-only mode.
    let remote = match &config.remote {
        Some(remote_config) => {
            match RemoteBackend::from_config(remote_config, config.remote_timeout_secs).await {
                Ok(backend) => Some(backend),
                Err(e) => {
                    tracing::warn!(error = %e, "Remote tier misconfigured, running local-only");
                    None
                }
            }
        }
        None => None,
    };
    let remote_kind = remote.as_ref().map(RemoteBackend::kind).unwrap_or("none");

    let store = RecordStore::new(LocalTier::new(&config.data_dir), remote)
        .with_remote_kind(remote_kind);
    tracing::info!(
        data_dir = %store.local().dir().display(),
        remote = remote_kind,
        remote_configured = store.remote_configured(),
        "Record store ready"
    );

    let insights = InsightService::new(&config.claude_api_key, &config.claude_model);
    if !insights.is_configured() {
        tracing::info!("CLAUDE_API_KEY not set, insights use the static fallback");
    }

    let state = AppState {
        store: Arc::new(store),
        insights: Arc::new(insights),
        config: config.clone(),
    };

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = Vec::new();
        if let Ok(hv) = config.frontend_url.parse::<axum::http::HeaderValue>() {
            origins.push(hv);
        }
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    let app = build_router(state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind listen address");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
    }
}
