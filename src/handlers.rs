use crate::config::Config;
use crate::settings_store::SettingsStore;
use crate::sharpspring_client::SharpSpringClient;
use axum::{http::StatusCode, Json};
use serde_json::json;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// SharpSpring account id and secret key.
    pub settings: SettingsStore,
    /// Client for the SharpSpring API.
    pub client: SharpSpringClient,
}

impl AppState {
    pub fn new(config: Config, settings: SettingsStore, client: SharpSpringClient) -> Self {
        Self {
            config,
            settings,
            client,
        }
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
