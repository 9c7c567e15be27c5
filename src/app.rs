use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};
use crate::lead_handler;
use crate::settings_handler::{self, SETTINGS_PATH};

pub const ADD_LEAD_PATH: &str = "/relativemarketing/sharpspring/v1/addLead/";

/// Largest accepted request body (lead forms and the settings form are tiny).
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Public lead-capture routes.
pub fn lead_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ADD_LEAD_PATH, post(lead_handler::add_lead))
        .route(
            ADD_LEAD_PATH.trim_end_matches('/'),
            post(lead_handler::add_lead),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Administrative settings routes.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            SETTINGS_PATH,
            get(settings_handler::settings_page).post(settings_handler::update_settings),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Adds the health check, state and outer middleware to a set of routes.
pub fn finish(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Lead forms are posted from the marketing site, usually another origin
        .layer(CorsLayer::permissive())
}

/// Full application router without rate limiting.
pub fn build_router(state: Arc<AppState>) -> Router {
    finish(lead_routes().merge(admin_routes()), state)
}
