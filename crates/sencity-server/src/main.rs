mod api;
mod auth;
mod middleware;

use std::sync::Arc;

use anyhow::Context;
use sencity_core::{load_place_resolver, PlaceResolver};
use sencity_navitia::{NavitiaClient, NavitiaSettings};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState, CorsPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = sencity_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = sencity_db::PoolConfig::from_app_config(&config);
    let pool = sencity_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = sencity_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let resolver = match &config.place_kinds_path {
        Some(path) => load_place_resolver(path)
            .with_context(|| format!("loading place kinds from {}", path.display()))?,
        None => PlaceResolver::default(),
    };
    let navitia = NavitiaClient::with_base_url(
        NavitiaSettings::from_app_config(&config),
        resolver,
        &config.navitia_base_url,
    )?;

    let state = AppState::new(
        pool,
        Arc::new(navitia),
        &config.auth_salt,
        config.detour_concurrency,
        config.closest_poi_radius_m,
    );
    let cors = CorsPolicy::new(&config.env, &config.cors_origins)
        .context("invalid SENCITY_CORS_ORIGINS entry")?;
    let app = build_app(state, default_rate_limit_state(), &cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        env = %config.env,
        coverage = %config.navitia_coverage,
        "listening"
    );
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
