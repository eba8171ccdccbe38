//! Team member model.

use serde::{Deserialize, Serialize};

/// Stored resume link when the resume is optional and none was given.
pub const NO_RESUME: &str = "N/A";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Leader,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Leader => "leader",
            MemberRole::Member => "member",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "leader" => Some(MemberRole::Leader),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

/// A person on a team. The leader is member number 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub team_id: i64,
    pub member_role: MemberRole,
    pub member_number: u8,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub resume_link: String,
    pub created_at: String,
}

/// Contact columns of a member, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub resume_link: String,
}

/// Insert payload for one member row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub team_id: i64,
    pub member_role: MemberRole,
    pub member_number: u8,
    pub contact: MemberContact,
}

impl NewMember {
    pub fn leader(team_id: i64, contact: MemberContact) -> Self {
        Self {
            team_id,
            member_role: MemberRole::Leader,
            member_number: 1,
            contact,
        }
    }

    pub fn member(team_id: i64, member_number: u8, contact: MemberContact) -> Self {
        Self {
            team_id,
            member_role: MemberRole::Member,
            member_number,
            contact,
        }
    }
}
