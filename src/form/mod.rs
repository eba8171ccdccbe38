//! In-progress registration form.
//!
//! [`FormState`] holds team details, the leader, and three member slots. The
//! slots always exist regardless of the chosen team size, so shrinking and
//! growing the team keeps what was typed. Changes go through
//! [`FormState::apply`]; nothing here validates.

use serde::{Deserialize, Serialize};

use crate::models::{ExistingTeam, Member, MemberContact, TeamRecord, MIN_TEAM_SIZE, NO_RESUME};
use crate::validation::{strip_whitespace, ResumePolicy};

/// Member slots besides the leader.
pub const MEMBER_SLOTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamFields {
    #[serde(default)]
    pub team_name: String,
    #[serde(default = "default_team_size")]
    pub team_size: u8,
    /// Empty until a track is picked.
    #[serde(default)]
    pub track_name: String,
}

fn default_team_size() -> u8 {
    MIN_TEAM_SIZE
}

impl Default for TeamFields {
    fn default() -> Self {
        Self {
            team_name: String::new(),
            team_size: MIN_TEAM_SIZE,
            track_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub resume_link: String,
}

impl MemberFields {
    /// Trimmed name, phone without whitespace, trimmed lowercase email, and
    /// the resume sentinel when the link is blank.
    pub fn normalized(&self, policy: ResumePolicy) -> MemberContact {
        let resume = self.resume_link.trim();
        let resume_link = if resume.is_empty() && policy == ResumePolicy::Optional {
            NO_RESUME.to_string()
        } else {
            resume.to_string()
        };

        MemberContact {
            name: self.name.trim().to_string(),
            phone: strip_whitespace(&self.phone),
            email: self.email.trim().to_lowercase(),
            resume_link,
        }
    }

    fn from_member(member: &Member) -> Self {
        let resume_link = if member.resume_link == NO_RESUME {
            String::new()
        } else {
            member.resume_link.clone()
        };
        Self {
            name: member.name.clone(),
            phone: member.phone.clone(),
            email: member.email.clone(),
            resume_link,
        }
    }

    fn set(&mut self, field: MemberField, value: String) {
        match field {
            MemberField::Name => self.name = value,
            MemberField::Phone => self.phone = value,
            MemberField::Email => self.email = value,
            MemberField::ResumeLink => self.resume_link = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberField {
    Name,
    Phone,
    Email,
    ResumeLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TeamField {
    Name(String),
    Size(u8),
    Track(String),
}

/// A single change to the form.
#[derive(Debug, Clone)]
pub enum FormAction {
    SetTeamField(TeamField),
    SetLeaderField(MemberField, String),
    /// `index` is the slot (0-based), i.e. member number minus two.
    SetMemberField(usize, MemberField, String),
    ShowError(String),
    Load(Box<ExistingTeam>),
    Reset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    #[serde(default)]
    pub team: TeamFields,
    #[serde(default)]
    pub leader: MemberFields,
    #[serde(default, deserialize_with = "slots::deserialize")]
    pub members: [MemberFields; MEMBER_SLOTS],
    /// Message currently shown on the form, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FormState {
    pub fn apply(&mut self, action: FormAction) {
        match action {
            FormAction::SetTeamField(field) => {
                match field {
                    TeamField::Name(name) => self.team.team_name = name,
                    TeamField::Size(size) => self.team.team_size = size,
                    TeamField::Track(track) => self.team.track_name = track,
                }
                self.error = None;
            }
            FormAction::SetLeaderField(field, value) => {
                self.leader.set(field, value);
                self.error = None;
            }
            FormAction::SetMemberField(index, field, value) => {
                if let Some(slot) = self.members.get_mut(index) {
                    slot.set(field, value);
                }
                self.error = None;
            }
            FormAction::ShowError(message) => self.error = Some(message),
            FormAction::Load(existing) => self.load(&existing),
            FormAction::Reset => *self = FormState::default(),
        }
    }

    /// Replace team, leader and the stored member slots with a looked-up team.
    /// Slots without a stored member keep their current contents.
    fn load(&mut self, existing: &ExistingTeam) {
        self.team = TeamFields {
            team_name: existing.team.team_name.clone(),
            team_size: existing.team.team_size,
            track_name: existing.team.track_name.clone(),
        };
        self.leader = MemberFields::from_member(&existing.leader);
        // Member numbers start at 2; number n fills slot n - 2.
        for member in &existing.members {
            let slot = usize::from(member.member_number)
                .checked_sub(2)
                .and_then(|index| self.members.get_mut(index));
            if let Some(slot) = slot {
                *slot = MemberFields::from_member(member);
            }
        }
        self.error = None;
    }

    /// Slots that count for the selected team size.
    pub fn active_members(&self) -> &[MemberFields] {
        let count = usize::from(self.team.team_size.saturating_sub(1)).min(MEMBER_SLOTS);
        &self.members[..count]
    }

    pub fn team_record(&self) -> TeamRecord {
        TeamRecord {
            team_name: self.team.team_name.trim().to_string(),
            team_size: self.team.team_size,
            track_name: self.team.track_name.trim().to_string(),
        }
    }
}

impl From<ExistingTeam> for FormState {
    fn from(existing: ExistingTeam) -> Self {
        let mut form = FormState::default();
        form.apply(FormAction::Load(Box::new(existing)));
        form
    }
}

/// Clients may send fewer than three member slots; missing ones are blank and
/// extra ones are dropped.
mod slots {
    use serde::{Deserialize, Deserializer};

    use super::{MemberFields, MEMBER_SLOTS};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[MemberFields; MEMBER_SLOTS], D::Error>
    where
        D: Deserializer<'de>,
    {
        let given = Vec::<MemberFields>::deserialize(deserializer)?;
        let mut slots: [MemberFields; MEMBER_SLOTS] = Default::default();
        for (slot, fields) in slots.iter_mut().zip(given) {
            *slot = fields;
        }
        Ok(slots)
    }
}
