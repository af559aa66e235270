//! The binary entry point for the application.

use std::sync::Arc;

use app_core::avatar::{AvatarFetcher, HttpAvatarFetcher};
use app_core::config::Config;
use app_core::middleware::request_response_logger;
use app_core::oauth::{GitHubProvider, GoogleProvider, PROVIDER_GITHUB, PROVIDER_GOOGLE, ProviderRegistry};
use axum::middleware;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_target(true))
        .init();

    if let Err(err) = run().await {
        panic!("Application failed to start: {err}");
    }
}

/// Initializes all dependencies and starts the web server.
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Read the environment once; the providers are immutable afterwards and
    // shared across all requests without locking.
    let config = Config::from_env()?;

    let google = GoogleProvider::new(
        config.get("google_client_id")?,
        config.get("google_client_secret")?,
        config.get("google_redirect_url")?,
    )?;
    let github = GitHubProvider::new(
        config.get("github_client_id")?,
        config.get("github_client_secret")?,
        config.get("github_redirect_url")?,
    )?;

    let mut providers = ProviderRegistry::new();
    providers.add_provider(PROVIDER_GOOGLE, Arc::new(google));
    providers.add_provider(PROVIDER_GITHUB, Arc::new(github));

    let avatars: Arc<dyn AvatarFetcher> = Arc::new(HttpAvatarFetcher::new());

    let state = login::new(login::Dependency { providers, avatars });

    let app = login::create_router(state).layer(middleware::from_fn(request_response_logger));

    let port: u16 = config.get("port")?;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;

    tracing::info!("Listening on http://localhost:{}", port);

    // Create a broadcast channel to signal shutdown to all application components.
    // Spawn a task to listen for shutdown signals (Ctrl+C and SIGTERM).
    let (shutdown_tx, _) = broadcast::channel(1);
    spawn_shutdown_listener(shutdown_tx.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_tx.subscribe().recv().await.ok();
            tracing::info!("Server is shutting down gracefully...");
        })
        .await?;

    Ok(())
}

/// Spawns a background task to listen for system shutdown signals.
fn spawn_shutdown_listener(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("Received SIGINT (Ctrl+C)") },
            _ = terminate => { tracing::info!("Received SIGTERM") },
        }

        if shutdown_tx.send(()).is_err() {
            tracing::error!("Failed to send shutdown signal");
        }
    });
}
