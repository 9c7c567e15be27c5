use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sharpspring_lead_api::app;
use sharpspring_lead_api::config::Config;
use sharpspring_lead_api::handlers::AppState;
use sharpspring_lead_api::settings_store::SettingsStore;
use sharpspring_lead_api::sharpspring_client::SharpSpringClient;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The credential store.
/// - The SharpSpring API client.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sharpspring_lead_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Credentials are read from the store on every lead submission
    let settings = SettingsStore::load(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {}", e))?;

    let client = SharpSpringClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize SharpSpring client: {}", e))?;
    tracing::info!("✓ SharpSpring client initialized: {}", client.api_url());

    let port = config.port;
    let app_state = Arc::new(AppState::new(config, settings, client));

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Rate limiting applies to the public lead endpoint only
    let routes = app::lead_routes()
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .merge(app::admin_routes());
    let router = app::finish(routes, app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
