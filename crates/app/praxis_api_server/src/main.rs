//! Praxis API server binary.
//!
//! Refuses to start unless `ENCRYPTION_KEY` and `JWT_SECRET` are valid.

use std::sync::Arc;

use clap::Parser;
use praxis_core::auth::jwt::JwtKeys;
use praxis_core::auth::queries::{PgRefreshTokenStore, PgUserDirectory};
use praxis_core::auth::service::AuthService;
use praxis_core::events::{EventBus, EventHandler, LedgerProjector};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "praxis_api_server", about = "Praxis practice management API")]
struct Args {
    /// Port to listen on. Overrides the port in `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/praxis"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 10)]
    max_connections: u32,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,praxis_api=debug,praxis_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = match praxis_api::config::ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("invalid configuration: {e}");
            return Err(e.into());
        }
    };
    config.database_url = args.database_url;
    if let Some(port) = args.port {
        let host = config
            .bind_addr
            .rsplit_once(':')
            .map_or("127.0.0.1", |(host, _)| host)
            .to_string();
        config.bind_addr = format!("{host}:{port}");
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        cookie_secure = config.cookie_secure,
        "starting praxis_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    info!("running database migrations");
    praxis_api::migrate(&pool).await?;

    let auth = AuthService::new(
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgRefreshTokenStore::new(pool.clone())),
        Arc::new(JwtKeys::from_secret(config.security.jwt_secret())),
    );

    let purged = auth.purge_expired().await?;
    info!(purged, "removed expired refresh tokens");

    let handlers: Vec<Arc<dyn EventHandler>> = vec![Arc::new(LedgerProjector::new(pool.clone()))];

    let state = praxis_api::AppState {
        pool,
        config: config.clone(),
        auth,
        events: EventBus::new(handlers),
    };

    let app = praxis_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
