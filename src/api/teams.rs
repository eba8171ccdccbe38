//! Team API endpoints.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use super::{parse_id, success, ApiResult, MultipartForm};
use crate::errors::AppError;
use crate::form::FormState;
use crate::models::{ExistingTeam, Registered, TeamSummary};
use crate::AppState;

/// A looked-up team plus the form pre-filled from it.
#[derive(Debug, Serialize)]
pub struct TeamDetails {
    #[serde(flatten)]
    pub existing: ExistingTeam,
    pub form: FormState,
}

fn team_id(raw: &str) -> Result<i64, AppError> {
    parse_id(raw).ok_or_else(|| AppError::NotFound("No team found with this ID".to_string()))
}

/// POST /api/teams - Register a team.
///
/// Multipart body: `registration` holds the form as JSON, `receipt` the
/// payment receipt when payments are enabled.
pub async fn register_team(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Registered> {
    let mut body = MultipartForm::read(multipart).await?;

    let raw = body
        .text("registration")
        .ok_or_else(|| AppError::BadRequest("Missing registration field".to_string()))?;
    let form: FormState = serde_json::from_str(raw)?;
    let receipt = body.take_file("receipt");

    let registered = state.registration.register(&form, receipt.as_ref()).await?;
    success(registered)
}

/// GET /api/teams/{id} - Look up a team for editing.
pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<TeamDetails> {
    let existing = state.registration.lookup(team_id(&id)?).await?;
    let form = FormState::from(existing.clone());
    success(TeamDetails { existing, form })
}

/// PUT /api/teams/{id} - Save edits to a team.
pub async fn update_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<FormState>,
) -> ApiResult<Registered> {
    let updated = state.registration.update(team_id(&id)?, &form).await?;
    success(updated)
}

/// GET /api/teams/{id}/summary - Validate a team ID before submitting.
pub async fn team_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<TeamSummary> {
    let id = parse_id(&id).ok_or_else(|| {
        AppError::InvalidTeam("Invalid Team ID. Please register your team first.".to_string())
    })?;
    let summary = state.submissions.validate_team(id).await?;
    success(summary)
}
