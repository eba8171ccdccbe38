//! Registration step controller.
//!
//! Moves through team info, member info and (when payments are on) the
//! payment step. Forward moves validate the step being left; backward moves
//! never validate.

use serde::{Deserialize, Serialize};

use crate::form::{FormState, MemberFields};
use crate::models::{Track, MAX_TEAM_SIZE, MIN_TEAM_SIZE};
use crate::validation::{self, Check, Invalid, ResumePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    TeamInfo,
    MembersInfo,
    Payment,
    Complete,
}

/// Outcome of a forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(Step),
    /// The current step is the last data step and it validated.
    ReadyToSubmit,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    payment_enabled: bool,
    resume_policy: ResumePolicy,
}

impl Wizard {
    pub fn new(payment_enabled: bool, resume_policy: ResumePolicy) -> Self {
        Self {
            step: Step::TeamInfo,
            payment_enabled,
            resume_policy,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Validate the current step and move forward.
    pub fn advance(&mut self, form: &FormState, receipt_attached: bool) -> Result<Advance, Invalid> {
        match self.step {
            Step::TeamInfo => {
                validate_team_info(form)?;
                self.step = Step::MembersInfo;
                Ok(Advance::Moved(Step::MembersInfo))
            }
            Step::MembersInfo => {
                validate_members(form, self.resume_policy)?;
                if self.payment_enabled {
                    self.step = Step::Payment;
                    Ok(Advance::Moved(Step::Payment))
                } else {
                    Ok(Advance::ReadyToSubmit)
                }
            }
            Step::Payment => {
                if !receipt_attached {
                    return Err(Invalid::new(
                        "receipt",
                        "Please upload your payment receipt",
                    ));
                }
                Ok(Advance::ReadyToSubmit)
            }
            Step::Complete => Err(Invalid::new("step", "Registration is already complete")),
        }
    }

    pub fn back(&mut self) -> Step {
        self.step = match self.step {
            Step::TeamInfo | Step::MembersInfo => Step::TeamInfo,
            Step::Payment => Step::MembersInfo,
            Step::Complete => Step::Complete,
        };
        self.step
    }

    /// Step back from `current` without validating anything.
    pub fn back_from(&mut self, current: Step) -> Step {
        self.step = current;
        self.back()
    }

    /// Walk forward from the first step until `target` is reached, validating
    /// every step on the way. Steps cannot be entered out of order.
    pub fn advance_to(
        &mut self,
        target: Step,
        form: &FormState,
        receipt_attached: bool,
    ) -> Result<(), Invalid> {
        if target == Step::Payment && !self.payment_enabled {
            return Err(Invalid::new("step", "Payment is not part of this registration"));
        }
        if target == Step::Complete {
            return Err(Invalid::new("step", "Registration is not complete"));
        }
        self.step = Step::TeamInfo;
        while self.step != target {
            self.advance(form, receipt_attached)?;
        }
        Ok(())
    }

    /// Run every forward transition; `Ok` means the form may be submitted.
    pub fn validate_through(&mut self, form: &FormState, receipt_attached: bool) -> Check {
        self.step = Step::TeamInfo;
        loop {
            if self.advance(form, receipt_attached)? == Advance::ReadyToSubmit {
                return Ok(());
            }
        }
    }

    /// Mark the registration as stored. Only valid once the form validated.
    pub fn complete(&mut self, form: &FormState, receipt_attached: bool) -> Check {
        self.validate_through(form, receipt_attached)?;
        self.step = Step::Complete;
        Ok(())
    }
}

fn validate_team_info(form: &FormState) -> Check {
    validation::required("teamName", "Team name", &form.team.team_name)?;
    if Track::from_str(form.team.track_name.trim()).is_none() {
        return Err(Invalid::new("trackName", "Please select a track"));
    }
    if !(MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&form.team.team_size) {
        return Err(Invalid::new(
            "teamSize",
            format!(
                "Team size must be between {}-{} members",
                MIN_TEAM_SIZE, MAX_TEAM_SIZE
            ),
        ));
    }
    Ok(())
}

/// Leader first, then members in member-number order; the first failure wins.
pub fn validate_members(form: &FormState, policy: ResumePolicy) -> Check {
    validate_member(&form.leader, "leader", "Team Leader", policy)?;
    for (index, member) in form.active_members().iter().enumerate() {
        let number = index + 2;
        validate_member(
            member,
            &format!("member{}", number),
            &format!("Member {}", number),
            policy,
        )?;
    }
    Ok(())
}

fn validate_member(fields: &MemberFields, key: &str, role: &str, policy: ResumePolicy) -> Check {
    validation::required(&format!("{}.name", key), &format!("{} name", role), &fields.name)?;
    validation::phone(&format!("{}.phone", key), role, &fields.phone)?;
    validation::email(&format!("{}.email", key), role, &fields.email)?;
    validation::resume_link(&format!("{}.resumeLink", key), role, &fields.resume_link, policy)
}
