//! Team model and the fixed track catalogue.

use serde::{Deserialize, Serialize};

use super::Member;

/// Smallest and largest supported team sizes, leader included.
pub const MIN_TEAM_SIZE: u8 = 2;
pub const MAX_TEAM_SIZE: u8 = 4;

/// Themed problem category a team commits to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Track {
    #[serde(rename = "Data Science & Machine Learning")]
    DataScience,
    #[serde(rename = "Blockchain & Cybersecurity")]
    BlockchainSecurity,
    #[serde(rename = "IoT & Robotics")]
    IotRobotics,
}

impl Track {
    pub const ALL: [Track; 3] = [
        Track::DataScience,
        Track::BlockchainSecurity,
        Track::IotRobotics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::DataScience => "Data Science & Machine Learning",
            Track::BlockchainSecurity => "Blockchain & Cybersecurity",
            Track::IotRobotics => "IoT & Robotics",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Track::ALL.into_iter().find(|track| track.as_str() == s)
    }
}

/// A registered team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub team_name: String,
    pub team_size: u8,
    pub track_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_receipt_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_uploaded_at: Option<String>,
    pub created_at: String,
}

/// Team columns written on create and on edit. The identifier is never part
/// of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub team_name: String,
    pub team_size: u8,
    pub track_name: String,
}

/// A team together with its members, as returned by a lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingTeam {
    pub team: Team,
    pub leader: Member,
    /// Non-leader members ordered by member number.
    pub members: Vec<Member>,
}

/// What the submission page shows after a team ID is validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub team_id: i64,
    pub team_name: String,
    pub leader_name: String,
}

/// Result of a successful registration. The ID is the reference the team
/// must keep for edits and submissions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    pub team_id: i64,
}
