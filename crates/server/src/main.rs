mod activity_store;
mod api;
mod auth;
mod config;
mod state;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use activity_store::ActivityStore;
use api::api_router;
use auth::AuthStore;
use axum::Router;
use catalog::Catalog;
use config::{config_path_from_env, load_or_create_config, resolve_path};
use parking_lot::RwLock;
use state::AppState;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let db_path = resolve_path(&config_path, &config.db_path);
    let db = Catalog::open_db(&db_path)?;
    let catalog = Catalog::with_db(Arc::clone(&db));
    catalog.init_tables()?;
    info!("Opened catalog at {:?}", db_path);

    let auth = AuthStore::new(
        Arc::clone(&db),
        Duration::from_secs(config.session_ttl_secs),
    );
    if let Err(err) = auth.init_tables() {
        warn!("Failed to create auth tables: {}", err);
    }
    match auth.has_any_user() {
        Ok(false) => info!("No users yet; POST /api/v1/auth/setup to create the first admin."),
        Ok(true) => {}
        Err(err) => warn!("Failed to read users: {}", err),
    }
    let activity = ActivityStore::new(Arc::clone(&db));
    if let Err(err) = activity.init_tables() {
        warn!("Failed to create activity table: {}", err);
    }

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let state = AppState {
        catalog,
        auth,
        activity,
        config: Arc::new(RwLock::new(config)),
    };

    let app = Router::new()
        .nest("/api/v1", api_router(state))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
