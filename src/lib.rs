//! AI Wars backend: application shell and startup wiring.

mod router;
mod settings;

use std::sync::Arc;

use app_core::config::Config;
use app_core::database::{self, SchemaRegistry};
use app_core::jwt::{JwtService, TokenManager};
use app_core::middleware::request_response_logger;
use app_core::oauth::{GoogleOAuthProvider, OAuthProvider};
use axum::middleware;
use tokio::signal;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;

use crate::settings::Settings;

const CONFIG_PATH: &str = "config/config.yaml";
const ENV_PREFIX: &str = "APP";

/// Initializes all dependencies and starts the web server.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real environments set variables directly.
    dotenvy::dotenv().ok();

    let config = Config::builder(CONFIG_PATH).env_prefix(ENV_PREFIX).build()?;
    let settings = Settings::from_config(&config)?;

    // Initialize the SeaORM database connection pool.
    let db = database::connect(settings.database).await?;
    if settings.create_schema {
        SchemaRegistry::new().create_all(&db).await?;
    }

    // Instantiate the JWT service; a missing or placeholder secret aborts startup.
    let token_manager: Arc<dyn TokenManager> = Arc::new(JwtService::new(settings.jwt)?);

    // Initialize the identity provider client.
    let oauth: Arc<dyn OAuthProvider> = Arc::new(GoogleOAuthProvider::new(
        settings.oauth.credentials,
        settings.oauth.endpoints,
        Some(settings.oauth.request_timeout),
    )?);

    // Initialize auth module
    let auth_state = auth::new(auth::Dependency {
        token: token_manager.clone(),
        oauth,
        frontend_url: settings.frontend_url,
    });

    // Create the Router and Middlewares
    let app = router::create_router_app(auth::create_router(auth_state, token_manager)).layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(request_response_logger))
            .layer(router::cors_layer(&settings.allowed_origin)?)
            .layer(RequestDecompressionLayer::new())
            .layer(CompressionLayer::new())
            .layer(router::timeout_layer(settings.server.timeout)),
    );

    let listener = tokio::net::TcpListener::bind(&settings.server.address).await?;

    tracing::info!("🚀 listening on {}", listener.local_addr()?);

    // Create a broadcast channel to signal shutdown to all application components.
    // Spawn a task to listen for shutdown signals (Ctrl+C and SIGTERM).
    let (shutdown_tx, _) = broadcast::channel(1);
    spawn_shutdown_listener(shutdown_tx.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_tx.subscribe().recv().await.ok();
            tracing::info!("🛑 Server is shutting down gracefully...");
        })
        .await?;

    db.close().await?;

    Ok(())
}

/// Spawns a background task to listen for system shutdown signals.
fn spawn_shutdown_listener(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to install Ctrl+C handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                },
                Err(e) => {
                    tracing::error!("Failed to install SIGTERM handler: {:?}", e);
                    std::future::pending::<()>().await;
                },
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("🔻 Received SIGINT (Ctrl+C)")},
            _ = terminate => { tracing::info!("🔻 Received SIGTERM")},
        }

        // Send the shutdown signal to all parts of the application.
        if shutdown_tx.send(()).is_err() {
            tracing::error!("Failed to send shutdown signal");
        }
    });
}
