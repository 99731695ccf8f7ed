//! Panel entry-point: loads settings, prepares the database and serves HTTP.

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use panel::inbound::http::health::HealthState;
use panel::outbound::persistence::{DbPool, run_pending_migrations};
use panel::settings::{BuildMode, PanelSettings};
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = PanelSettings::load().map_err(|e| io::Error::other(e.to_string()))?;
    let session = settings
        .session_settings(BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;

    let mut config = ServerConfig::new(session, bind_addr)
        .with_request_timeout(settings.request_timeout().map_err(io::Error::other)?)
        .with_policy(settings.provisioning_policy().map_err(io::Error::other)?);

    match (settings.pool_config(), settings.database_url.clone()) {
        (Some(pool_config), Some(database_url)) => {
            let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&database_url))
                .await
                .map_err(io::Error::other)?
                .map_err(io::Error::other)?;
            info!(applied, "database migrations applied");
            let pool = DbPool::new(pool_config).await.map_err(io::Error::other)?;
            config = config.with_db_pool(pool);
        }
        _ => warn!("PANEL_DATABASE_URL not set; serving fixture data"),
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(server::build_metrics()?));
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting panel");
    create_server(health_state, config)?.await
}
