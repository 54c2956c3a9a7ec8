mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use uppi_consolidator::{Consolidator, ConsolidatorConfig, HttpProbe, Validator};
use uppi_db::PgStore;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = uppi_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = uppi_db::PoolConfig::from_app_config(&config);
    let pool = uppi_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = uppi_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let weights = match &config.field_weights_path {
        Some(path) => uppi_core::load_field_weights(path)?,
        None => uppi_core::FieldWeights::default(),
    };
    let consolidator = Consolidator::new(
        PgStore::new(pool.clone()),
        Validator::new(HttpProbe::from_app_config(&config)?),
        ConsolidatorConfig::from_app_config(&config, weights),
    );

    let app = build_app(AppState {
        pool,
        consolidator: Arc::new(consolidator),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "uppi-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
