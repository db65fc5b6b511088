use anyhow::Result;
use axum::Router;
use obd_dashboard::{api, config, ingest, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;

    if cfg.auth.jwt_secret.is_empty() || cfg.auth.jwt_secret.starts_with("__SET_VIA_ENV") {
        anyhow::bail!(
            "SECURITY ERROR: OBD__AUTH__JWT_SECRET environment variable must be set to a secure random secret (min 32 chars). \
            Generate one with: openssl rand -base64 32"
        );
    }

    if cfg.auth.jwt_secret == "devsecret" {
        warn!("Using 'devsecret' JWT secret - this is only safe for local development!");
    }

    let app_state = ingest::AppState::new(cfg.clone()).await?;

    let app: Router = api::router(app_state.clone(), &cfg);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" {
        warn!(
            "WARNING: Server binding to 0.0.0.0 - service will be accessible from network! \
            For production, bind to 127.0.0.1 unless behind a firewall/reverse proxy."
        );
    }

    info!(%addr, "starting OBD dashboard backend");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
