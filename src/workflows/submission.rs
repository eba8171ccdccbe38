//! Presentation submission: validate a team, submit once, view, replace.

use std::sync::Arc;

use chrono::Utc;

use super::upload_stamp;
use crate::db::{RecordStore, StoreError};
use crate::errors::AppError;
use crate::models::{NewSubmission, Submission, SubmissionFileUpdate, SubmissionView, TeamSummary};
use crate::storage::{key_from_public_url, ObjectStorage, UploadedFile};
use crate::validation::{self, FileRule, Invalid};

const INVALID_TEAM: &str = "Invalid Team ID. Please register your team first.";
const ALREADY_SUBMITTED: &str = "This Team ID has already submitted. Use the edit option to update.";
const REPO_REQUIRED: &str = "Please enter your GitHub repository link";
const REPO_INVALID: &str = "Please enter a valid GitHub repository URL";
const FILE_REQUIRED: &str = "Please upload your presentation file";
const NEW_FILE_REQUIRED: &str = "Please select a new file to upload";
/// Shown when the team has no leader row.
const UNKNOWN_LEADER: &str = "N/A";

#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub bucket: String,
    pub rule: FileRule,
}

pub struct SubmissionWorkflow {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStorage>,
    settings: SubmissionSettings,
}

impl SubmissionWorkflow {
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStorage>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            records,
            objects,
            settings,
        }
    }

    /// Confirm a team ID and return what the page shows about it.
    pub async fn validate_team(&self, team_id: i64) -> Result<TeamSummary, AppError> {
        let team = self
            .records
            .get_team(team_id)
            .await
            .map_err(|e| AppError::store("Error fetching team data", e))?
            .ok_or_else(|| AppError::InvalidTeam(INVALID_TEAM.to_string()))?;

        let leader_name = self
            .leader_name(team_id, "Error fetching team leader information")
            .await?
            .unwrap_or_else(|| UNKNOWN_LEADER.to_string());

        Ok(TeamSummary {
            team_id,
            team_name: team.team_name,
            leader_name,
        })
    }

    async fn leader_name(
        &self,
        team_id: i64,
        context: &str,
    ) -> Result<Option<String>, AppError> {
        let leader = self
            .records
            .find_leader(team_id)
            .await
            .map_err(|e| AppError::store(context, e))?;
        Ok(leader.map(|l| l.name))
    }

    /// File a team's one presentation. Everything is validated before the
    /// upload; a failed record insert removes the uploaded file again.
    pub async fn submit(
        &self,
        team_id: i64,
        repo_url: &str,
        file: Option<UploadedFile>,
    ) -> Result<Submission, AppError> {
        let team_exists = self
            .records
            .get_team(team_id)
            .await
            .map_err(|e| AppError::store("Error fetching team data", e))?
            .is_some();
        if !team_exists {
            return Err(AppError::InvalidTeam(INVALID_TEAM.to_string()));
        }

        let existing = self
            .records
            .find_submission_by_team(team_id)
            .await
            .map_err(|e| AppError::store("Error checking existing submission", e))?;
        if existing.is_some() {
            return Err(AppError::AlreadySubmitted(ALREADY_SUBMITTED.to_string()));
        }

        validation::required("repoUrl", "GitHub repository link", repo_url)
            .map_err(|_| Invalid::new("repoUrl", REPO_REQUIRED))?;
        validation::url("repoUrl", REPO_INVALID, repo_url)?;
        let file = file.ok_or_else(|| Invalid::new("file", FILE_REQUIRED))?;
        validation::file_constraint("file", &file, &self.settings.rule)?;

        let key = format!(
            "{}_team{}.{}",
            upload_stamp(Utc::now()),
            team_id,
            file.extension()
        );
        let url = self.upload(&key, &file).await?;

        let new = NewSubmission {
            team_id,
            ppt_file_url: url,
            ppt_file_name: file.file_name.clone(),
            file_size_mb: file.size_mb(),
            github_link: repo_url.trim().to_string(),
        };

        match self.records.insert_submission(&new).await {
            Ok(submission) => {
                tracing::info!(team_id, submission_id = submission.id, "Presentation submitted");
                Ok(submission)
            }
            Err(e) => {
                tracing::warn!(team_id, key = %key, "Submission record failed, removing upload");
                self.remove_quietly(&key).await;
                match e {
                    StoreError::Duplicate(_) => {
                        Err(AppError::AlreadySubmitted(ALREADY_SUBMITTED.to_string()))
                    }
                    other => Err(AppError::store("Database error", other)),
                }
            }
        }
    }

    /// A team's submission with its team and leader names.
    pub async fn view(&self, team_id: i64) -> Result<SubmissionView, AppError> {
        let submission = self
            .records
            .find_submission_by_team(team_id)
            .await
            .map_err(|e| AppError::store("Error fetching submission", e))?
            .ok_or_else(|| AppError::NotFound("No submission found for this Team ID".to_string()))?;

        let team = self
            .records
            .get_team(team_id)
            .await
            .map_err(|e| AppError::store("Error fetching team details", e))?
            .ok_or_else(|| AppError::InvalidTeam(INVALID_TEAM.to_string()))?;

        // A filed submission whose team lost its leader row is a data fault.
        let team_leader_name = self
            .leader_name(team_id, "Error fetching team details")
            .await?
            .ok_or_else(|| AppError::LeaderMissing("Error fetching team details".to_string()))?;

        Ok(SubmissionView {
            submission,
            team_name: team.team_name,
            team_leader_name,
        })
    }

    /// Swap the file of an existing submission, optionally with a new
    /// repository link. The old object goes first.
    pub async fn replace(
        &self,
        submission_id: i64,
        file: Option<UploadedFile>,
        repo_url: Option<&str>,
    ) -> Result<Submission, AppError> {
        let current = self
            .records
            .get_submission(submission_id)
            .await
            .map_err(|e| AppError::store("Error fetching submission", e))?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        let file = file.ok_or_else(|| Invalid::new("file", NEW_FILE_REQUIRED))?;
        validation::file_constraint("file", &file, &self.settings.rule)?;

        let repo_url = repo_url.map(str::trim).filter(|url| !url.is_empty());
        if let Some(url) = repo_url {
            validation::url("repoUrl", REPO_INVALID, url)?;
        }

        match key_from_public_url(&current.ppt_file_url, &self.settings.bucket) {
            Some(old_key) => self.remove_quietly(&old_key).await,
            None => tracing::warn!(
                submission_id,
                url = %current.ppt_file_url,
                "Stored file URL has no object key"
            ),
        }

        let key = format!(
            "{}_team{}.{}",
            upload_stamp(Utc::now()),
            current.team_id,
            file.extension()
        );
        let url = self.upload(&key, &file).await?;

        let update = SubmissionFileUpdate {
            ppt_file_url: url,
            ppt_file_name: file.file_name.clone(),
            file_size_mb: file.size_mb(),
            github_link: repo_url.map(str::to_string),
        };

        let submission = self
            .records
            .update_submission_file(submission_id, &update)
            .await
            .map_err(|e| AppError::store("Update failed", e))?;

        tracing::info!(submission_id, team_id = submission.team_id, "Presentation replaced");
        Ok(submission)
    }

    async fn upload(&self, key: &str, file: &UploadedFile) -> Result<String, AppError> {
        tracing::debug!(key, bytes = file.len(), "Uploading presentation");
        self.objects
            .upload(&self.settings.bucket, key, &file.bytes, &file.content_type)
            .await
            .map_err(|e| AppError::upload("Upload failed", e))?;
        Ok(self.objects.public_url(&self.settings.bucket, key))
    }

    async fn remove_quietly(&self, key: &str) {
        if let Err(e) = self
            .objects
            .remove(&self.settings.bucket, &[key.to_string()])
            .await
        {
            tracing::warn!(key, "Failed to remove presentation: {}", e);
        }
    }
}
