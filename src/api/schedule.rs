//! Countdown endpoint.

use axum::extract::State;
use chrono::Utc;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::schedule::CountdownStatus;
use crate::AppState;

/// GET /api/countdown - Time left until the next milestone.
pub async fn countdown(State(state): State<AppState>) -> ApiResult<CountdownStatus> {
    let schedule = state
        .schedule
        .as_ref()
        .ok_or_else(|| AppError::NotFound("No event schedule configured".to_string()))?;
    success(schedule.status(Utc::now()))
}
