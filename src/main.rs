//! Hackathon registration backend server.

use hackathon_backend::config::Config;
use hackathon_backend::logging::init_logging;
use hackathon_backend::{build_state, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    init_logging(&config.log_level, config.log_format);
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!("Starting hackathon backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Storage directory: {:?}", config.storage_dir);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        payment_enabled = config.payment_enabled,
        resume_policy = ?config.resume_policy,
        "Registration settings"
    );
    if config.schedule.is_none() {
        tracing::warn!("No event schedule configured (HACK_START_TIME, HACK_FINAL_SUBMISSION_TIME)");
    }

    let state = build_state(&config).await?;
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
