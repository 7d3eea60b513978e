//! Mission Control API: habit "missions" with daily or weekly schedules,
//! completion toggling, streak bookkeeping and a cross-mission progress
//! summary, served over HTTP with live updates on a WebSocket.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use config::Config;
use services::missions::MissionService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub missions: MissionService,
    pub ws_tx: Option<broadcast::Sender<String>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, missions: MissionService) -> Self {
        let (ws_tx, _) = broadcast::channel::<String>(256);
        Self {
            config,
            missions,
            ws_tx: Some(ws_tx),
        }
    }
}

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler));

    let protected_routes = Router::new()
        // Missions
        .route(
            "/api/missions",
            get(handlers::missions::list_missions).post(handlers::missions::create_mission),
        )
        .route("/api/missions/today", get(handlers::missions::todays_missions))
        .route(
            "/api/missions/:id",
            get(handlers::missions::get_mission)
                .put(handlers::missions::update_mission)
                .delete(handlers::missions::delete_mission),
        )
        .route(
            "/api/missions/:id/toggle",
            post(handlers::missions::toggle_mission),
        )
        .route(
            "/api/missions/:id/activate",
            post(handlers::missions::activate_mission),
        )
        .route(
            "/api/missions/:id/pause",
            post(handlers::missions::pause_mission),
        )
        // Progress
        .route("/api/progress", get(handlers::progress::get_progress))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = vec![config
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|_| anyhow::anyhow!("FRONTEND_URL is not a valid origin: {}", config.frontend_url))?];
    for o in &config.cors_extra_origins {
        match o.parse::<HeaderValue>() {
            Ok(hv) => origins.push(hv),
            Err(_) => tracing::warn!(origin = %o, "Ignoring invalid CORS origin"),
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true))
}
