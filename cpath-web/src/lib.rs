//! cpath-web library - career path collection and charts
//!
//! Collects free-text career histories through a web form, parses them onto
//! a fixed stage vocabulary, accumulates aggregate counters in SQLite and
//! renders the aggregates as embedded SVG charts.

pub mod api;
pub mod charts;
pub mod db;
pub mod error;
pub mod parser;
pub mod submissions;
pub mod vocab;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use cpath_common::config::{RootFolderInitializer, TomlConfig};

/// Runtime settings the handlers need
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Raw submissions log file
    pub submissions_log: PathBuf,
    /// Career-length histogram bucket width in years
    pub bucket_width_years: u32,
    /// Enables `POST /delete`
    pub allow_delete: bool,
}

impl WebConfig {
    pub fn new(root: &RootFolderInitializer, toml: &TomlConfig) -> Self {
        Self {
            submissions_log: root.submissions_log_path(),
            bucket_width_years: toml.bucket_width_years,
            allow_delete: toml.allow_delete,
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub config: Arc<WebConfig>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: WebConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    // HTML pages
    let pages = Router::new()
        .route("/", get(api::show_form).post(api::submit_form))
        .route("/plot", get(api::plot_page))
        .route("/about", get(api::about_page))
        .route("/static/style.css", get(api::serve_style_css))
        .route("/delete", post(api::delete_data));

    // JSON API
    let json_api = Router::new()
        .route("/api/stats", get(api::get_stats))
        .route("/api/parse", post(api::parse_preview))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(pages)
        .merge(json_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
