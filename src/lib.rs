use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::{analysis_service::AnalysisService, analysis_store::AnalysisStore};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub analysis: AnalysisService,
}

impl AppState {
    pub fn new(config: config::Config, store: Arc<AnalysisStore>) -> Self {
        Self {
            config,
            analysis: AnalysisService::new(store),
        }
    }
}

/// Builds the full HTTP application over `state`.
pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size;

    Router::new()
        .merge(routes::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
