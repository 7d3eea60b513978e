use anyhow::Context;
use std::sync::Arc;

use mission_control::config::Config;
use mission_control::db;
use mission_control::services::missions::{MissionService, ServiceSettings};
use mission_control::services::notifications::{LogNotifier, Notifier, WebhookNotifier};
use mission_control::store::{MemoryMissionStore, MissionStore, PgMissionStore};
use mission_control::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mission_control=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);
    let calendar = config.calendar()?;

    let store: Arc<dyn MissionStore> = match &config.database_url {
        Some(url) => {
            let pool = db::pool::create_pool(url)
                .await
                .context("Failed to create database pool")?;
            db::pool::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            Arc::new(PgMissionStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, missions are kept in memory only");
            Arc::new(MemoryMissionStore::new())
        }
    };

    let notifier: Arc<dyn Notifier> = match &config.push_gateway_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            config.push_gateway_token.clone(),
        )),
        None => Arc::new(LogNotifier),
    };

    let missions = MissionService::new(
        store,
        notifier,
        calendar,
        ServiceSettings {
            toggle_max_attempts: config.toggle_max_attempts,
            streak_alert_min: config.streak_alert_min,
        },
    );

    let state = AppState::new(config.clone(), missions);
    let app = build_router(state)?;

    let addr = config.listen_addr();
    tracing::info!(
        calendar_zone = %calendar.zone(),
        week_start = ?calendar.week_start(),
        "Starting server on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
