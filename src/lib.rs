//! Hackathon registration backend.
//!
//! Team registration with a multi-step form, team editing, and a one-time
//! presentation submission per team, served over REST with SQLite records
//! and local object storage.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod form;
pub mod logging;
pub mod models;
pub mod schedule;
pub mod storage;
pub mod validation;
pub mod wizard;
pub mod workflows;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use schedule::Schedule;
use storage::LocalObjectStorage;
use validation::FileRule;
use workflows::{
    ReceiptSettings, RegistrationSettings, RegistrationWorkflow, SubmissionSettings,
    SubmissionWorkflow,
};

/// Headroom on top of the largest file for the other multipart fields.
const BODY_OVERHEAD: u64 = 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationWorkflow>,
    pub submissions: Arc<SubmissionWorkflow>,
    pub schedule: Option<Arc<Schedule>>,
    pub config: Arc<Config>,
}

/// Open the database and storage and wire the workflows.
pub async fn build_state(config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let pool = db::init_database(&config.db_path).await?;
    let records = Arc::new(Repository::new(pool));

    tokio::fs::create_dir_all(&config.storage_dir).await?;
    let objects = Arc::new(LocalObjectStorage::new(
        config.storage_dir.clone(),
        &config.public_base_url,
    ));

    let receipts = config.payment_enabled.then(|| ReceiptSettings {
        bucket: config.receipts_bucket.clone(),
        rule: FileRule::receipt(config.max_receipt_bytes),
    });

    let registration = RegistrationWorkflow::new(
        records.clone(),
        objects.clone(),
        RegistrationSettings {
            resume_policy: config.resume_policy,
            receipts,
        },
    );

    let submissions = SubmissionWorkflow::new(
        records,
        objects,
        SubmissionSettings {
            bucket: config.submissions_bucket.clone(),
            rule: FileRule::presentation(config.max_presentation_bytes),
        },
    );

    Ok(AppState {
        registration: Arc::new(registration),
        submissions: Arc::new(submissions),
        schedule: config.schedule.clone().map(Arc::new),
        config: Arc::new(config.clone()),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = body_limit(&state.config);
    let storage = ServeDir::new(&state.config.storage_dir);

    // API routes
    let api_routes = Router::new()
        // Registration form
        .route("/tracks", get(api::list_tracks))
        .route("/registration/steps", post(api::registration_step))
        // Teams
        .route("/teams", post(api::register_team))
        .route("/teams/{id}", get(api::get_team).put(api::update_team))
        .route("/teams/{id}/summary", get(api::team_summary))
        // Submissions
        .route("/submissions", post(api::create_submission))
        .route("/submissions/team/{team_id}", get(api::get_team_submission))
        .route("/submissions/{id}", put(api::replace_submission))
        // Schedule
        .route("/countdown", get(api::countdown))
        .layer(DefaultBodyLimit::max(body_limit));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/storage", storage)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request body cap: the largest upload plus room for the other fields.
fn body_limit(config: &Config) -> usize {
    let bytes = config.max_upload_bytes().saturating_add(BODY_OVERHEAD);
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod testing;
