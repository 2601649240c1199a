mod config;

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{MethodRouter, get_service},
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use invoicer_api::auth::AppState;
use invoicer_api::middleware::require_session_or_redirect;
use invoicer_api::{Ledger, router};
use invoicer_db::Database;
use invoicer_oracle::{HttpBalanceOracle, Reconciler};
use invoicer_wallet::{CommandKeyGenerator, Ed25519KeyGenerator, KeyGenerator, WalletProvisioner};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "invoicer=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let keygen: Arc<dyn KeyGenerator> = match &config.keygen_cmd {
        Some(cmd) => {
            let keygen = CommandKeyGenerator::from_command_line(cmd, config.keygen_timeout)?;
            info!("Wallet keys from external command {}", keygen.program());
            Arc::new(keygen)
        }
        None => {
            info!("Wallet keys from built-in ed25519 generator");
            Arc::new(Ed25519KeyGenerator)
        }
    };

    let oracle = HttpBalanceOracle::new(&config.oracle_url)?;
    info!(
        "Balance oracle at {} (timeout {:?})",
        config.oracle_url, config.oracle_timeout
    );

    // The store is in memory: every start begins empty.
    let ledger = Ledger::new(
        Database::open_in_memory()?,
        WalletProvisioner::new(keygen),
        Reconciler::new(Arc::new(oracle), config.oracle_timeout),
    );
    let state: AppState = Arc::new(ledger);

    let app = app(state, &config).layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Invoicer listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Ledger routes plus the single-page client: `index.html` for page routes,
/// everything else from the static directory.
fn app(state: AppState, config: &Config) -> Router {
    let public_pages = Router::new()
        .route("/", index(&config.index_html))
        .route("/signin", index(&config.index_html));

    let private_pages = Router::new()
        .route("/invoices", index(&config.index_html))
        .route("/invoices/{id}", index(&config.index_html))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session_or_redirect,
        ));

    Router::new()
        .merge(router::router(state.clone()))
        .merge(public_pages)
        .merge(private_pages.with_state(state))
        .fallback_service(ServeDir::new(&config.static_dir))
}

fn index<S>(path: &Path) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    get_service(ServeFile::new(path))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
