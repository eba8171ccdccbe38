//! Presentation submission endpoints.

use axum::extract::{Multipart, Path, State};

use super::{parse_id, success, ApiResult, MultipartForm};
use crate::errors::AppError;
use crate::models::{Submission, SubmissionView};
use crate::AppState;

const INVALID_TEAM: &str = "Invalid Team ID. Please register your team first.";

/// POST /api/submissions - Submit a presentation.
///
/// Multipart body: `teamId`, `repoUrl`, and the `file` itself.
pub async fn create_submission(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Submission> {
    let mut body = MultipartForm::read(multipart).await?;

    let team_id = body
        .text("teamId")
        .and_then(parse_id)
        .ok_or_else(|| AppError::InvalidTeam(INVALID_TEAM.to_string()))?;
    let repo_url = body.text("repoUrl").unwrap_or_default().to_string();
    let file = body.take_file("file");

    let submission = state.submissions.submit(team_id, &repo_url, file).await?;
    success(submission)
}

/// GET /api/submissions/team/{teamId} - View a team's submission.
pub async fn get_team_submission(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> ApiResult<SubmissionView> {
    let team_id =
        parse_id(&team_id).ok_or_else(|| AppError::InvalidTeam(INVALID_TEAM.to_string()))?;
    let view = state.submissions.view(team_id).await?;
    success(view)
}

/// PUT /api/submissions/{id} - Replace the presentation file.
///
/// Multipart body: `file`, and `repoUrl` to change the link as well.
pub async fn replace_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Submission> {
    let id = parse_id(&id).ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;
    let mut body = MultipartForm::read(multipart).await?;

    let repo_url = body.text("repoUrl").map(str::to_string);
    let file = body.take_file("file");

    let submission = state
        .submissions
        .replace(id, file, repo_url.as_deref())
        .await?;
    success(submission)
}
