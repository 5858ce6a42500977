mod api;
mod middleware;
mod public;

use std::sync::Arc;

use qrshop_core::AppConfig;
use qrshop_shopify::{AdminClient, AdminClientConfig};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = qrshop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = qrshop_db::PoolConfig::from_app_config(&config);
    let pool = qrshop_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = qrshop_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    let shopify = AdminClient::new(&admin_client_config(&config))?;
    let auth = AuthState::from_env(matches!(config.env, qrshop_core::Environment::Development))?;
    let state = AppState {
        pool,
        shopify: Arc::new(shopify),
        app_url: config.app_url.clone(),
        access_token: config.shopify_access_token.clone(),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "qrshop server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn admin_client_config(config: &AppConfig) -> AdminClientConfig {
    AdminClientConfig {
        timeout_secs: config.shopify_request_timeout_secs,
        user_agent: config.shopify_user_agent.clone(),
        api_version: config.shopify_api_version.clone(),
        max_retries: config.shopify_max_retries,
        backoff_base_secs: config.shopify_retry_backoff_base_secs,
        admin_origin: config.shopify_admin_origin.clone(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
