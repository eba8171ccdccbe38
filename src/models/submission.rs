//! Presentation submission model.

use serde::{Deserialize, Serialize};

/// The one presentation file and repository link a team files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub team_id: i64,
    pub ppt_file_url: String,
    pub ppt_file_name: String,
    /// Size in megabytes with two decimals, e.g. `"2.35"`.
    pub file_size_mb: String,
    pub github_link: String,
    pub submitted_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub team_id: i64,
    pub ppt_file_url: String,
    pub ppt_file_name: String,
    pub file_size_mb: String,
    pub github_link: String,
}

/// File fields replaced by an edit. The repository link is kept when `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFileUpdate {
    pub ppt_file_url: String,
    pub ppt_file_name: String,
    pub file_size_mb: String,
    pub github_link: Option<String>,
}

/// A submission with the team details shown next to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: Submission,
    pub team_name: String,
    pub team_leader_name: String,
}
