//! Registration form endpoints: track catalogue and step transitions.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::form::FormState;
use crate::models::Track;
use crate::validation::ResumePolicy;
use crate::wizard::{Advance, Step};
use crate::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    #[default]
    Next,
    Back,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    /// Step the page is currently showing.
    pub step: Step,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub form: FormState,
    #[serde(default)]
    pub receipt_attached: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub step: Step,
    /// The current step was the last one and the form may now be submitted.
    pub ready_to_submit: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    pub tracks: Vec<&'static str>,
    pub payment_enabled: bool,
    pub resume_required: bool,
}

/// GET /api/tracks - Track list and registration switches.
pub async fn list_tracks(State(state): State<AppState>) -> ApiResult<RegistrationOptions> {
    success(RegistrationOptions {
        tracks: Track::ALL.iter().map(Track::as_str).collect(),
        payment_enabled: state.registration.payment_enabled(),
        resume_required: state.config.resume_policy == ResumePolicy::Required,
    })
}

/// POST /api/registration/steps - Run one step transition.
///
/// Moving forward re-checks every step before `step`, so a client cannot
/// skip ahead.
pub async fn registration_step(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> ApiResult<StepResponse> {
    let mut wizard = state.registration.wizard();

    let response = match request.direction {
        Direction::Back => StepResponse {
            step: wizard.back_from(request.step),
            ready_to_submit: false,
        },
        Direction::Next => {
            wizard.advance_to(request.step, &request.form, request.receipt_attached)?;
            match wizard.advance(&request.form, request.receipt_attached)? {
                Advance::Moved(step) => StepResponse {
                    step,
                    ready_to_submit: false,
                },
                Advance::ReadyToSubmit => StepResponse {
                    step: request.step,
                    ready_to_submit: true,
                },
            }
        }
    };

    tracing::debug!(
        from = ?request.step,
        to = ?response.step,
        ready = response.ready_to_submit,
        "Registration step"
    );
    success(response)
}
