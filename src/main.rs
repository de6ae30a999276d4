//! Questboard - JSON API for quest cards, tags and saved queries.
//!
//! This binary loads configuration, wires the document store and media host
//! into the router and starts the HTTP server.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use questboard::{
    config::{Config, StoreBackend},
    media::{CloudinaryCredentials, CloudinaryHost, MediaHost},
    server::{create_router, AppState, RouterConfig},
    session::SessionStore,
    store::{DocumentStore, FirestoreStore, MemoryStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let config = Config::parse();

    init_logging(config.verbose);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Questboard v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");

    let store: Arc<dyn DocumentStore> = match config.store {
        StoreBackend::Firestore => {
            let project = config.firestore_project.clone().unwrap_or_default();
            let store = match FirestoreStore::new(
                client.clone(),
                &config.firestore_endpoint,
                &project,
                &config.firestore_database,
            ) {
                Ok(store) => store,
                Err(e) => {
                    error!("Configuration error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            info!("  Store: firestore ({})", store.root());
            match config.firestore_token.clone() {
                Some(token) => Arc::new(store.with_access_token(token)),
                None => {
                    warn!("  No Firestore access token; requests are unauthenticated");
                    Arc::new(store)
                }
            }
        }
        StoreBackend::Memory => {
            warn!("  Store: memory - data is lost when the server stops");
            Arc::new(MemoryStore::new())
        }
    };

    let credentials = CloudinaryCredentials {
        cloud_name: config.cloudinary_cloud_name.clone().unwrap_or_default(),
        api_key: config.cloudinary_api_key.clone().unwrap_or_default(),
        api_secret: config.cloudinary_api_secret.clone().unwrap_or_default(),
    };
    info!(
        "  Media: cloudinary ({}, cloud {})",
        config.cloudinary_endpoint, credentials.cloud_name
    );
    let media: Arc<dyn MediaHost> = Arc::new(CloudinaryHost::new(
        client,
        &config.cloudinary_endpoint,
        credentials,
    ));

    let Some(ttl) = chrono::Duration::try_minutes(config.session_ttl_minutes) else {
        error!(
            "Configuration error: session lifetime of {} minutes is out of range",
            config.session_ttl_minutes
        );
        return ExitCode::FAILURE;
    };
    let sessions = SessionStore::with_ttl(ttl);
    info!("  Sessions: {} minute lifetime", config.session_ttl_minutes);
    info!("  Static assets: {}", config.static_dir.display());
    if !config.static_dir.join("index.html").is_file() {
        warn!(
            "  {} has no index.html; unmatched paths will return 404",
            config.static_dir.display()
        );
    }

    let state = AppState::new(store, media, config.admin_secret_or_empty())
        .with_sessions(sessions);
    let router = create_router(state, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "questboard=debug,tower_http=debug"
    } else {
        "questboard=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new(config.static_dir.clone())
        .with_max_upload_bytes(config.max_upload_bytes);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
