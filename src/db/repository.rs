//! SQLite repository for teams, members and submissions.
//!
//! Uses prepared statements and transactions for data integrity.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{RecordStore, StoreError};
use crate::models::{
    Member, MemberContact, MemberRole, NewMember, NewSubmission, Submission,
    SubmissionFileUpdate, Team, TeamRecord,
};

const TEAM_COLUMNS: &str = "id, team_name, team_size, track_name, payment_receipt_url, payment_uploaded_at, created_at";
const MEMBER_COLUMNS: &str =
    "id, team_id, member_role, member_number, name, phone, email, resume_link, created_at";
const SUBMISSION_COLUMNS: &str = "id, team_id, ppt_file_url, ppt_file_name, file_size_mb, github_link, submitted_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for Repository {
    // ==================== TEAM OPERATIONS ====================

    async fn find_team_by_name(&self, team_name: &str) -> Result<Option<Team>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM teams WHERE team_name = ?",
            TEAM_COLUMNS
        ))
        .bind(team_name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn get_team(&self, id: i64) -> Result<Option<Team>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM teams WHERE id = ?", TEAM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(team_from_row).transpose()
    }

    async fn insert_team(&self, team: &TeamRecord) -> Result<Team, StoreError> {
        let now = Utc::now().to_rfc3339();

        let id = sqlx::query(
            "INSERT INTO teams (team_name, team_size, track_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&team.team_name)
        .bind(i64::from(team.team_size))
        .bind(&team.track_name)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Team {
            id,
            team_name: team.team_name.clone(),
            team_size: team.team_size,
            track_name: team.track_name.clone(),
            payment_receipt_url: None,
            payment_uploaded_at: None,
            created_at: now,
        })
    }

    async fn update_team(&self, id: i64, team: &TeamRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE teams SET team_name = ?, team_size = ?, track_name = ? WHERE id = ?",
        )
        .bind(&team.team_name)
        .bind(i64::from(team.team_size))
        .bind(&team.track_name)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Team {}", id)));
        }
        Ok(())
    }

    async fn set_team_receipt(
        &self,
        id: i64,
        receipt_url: &str,
        uploaded_at: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE teams SET payment_receipt_url = ?, payment_uploaded_at = ? WHERE id = ?",
        )
        .bind(receipt_url)
        .bind(uploaded_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Team {}", id)));
        }
        Ok(())
    }

    async fn delete_team(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Team {}", id)));
        }
        Ok(())
    }

    // ==================== MEMBER OPERATIONS ====================

    async fn insert_members(&self, members: &[NewMember]) -> Result<Vec<Member>, StoreError> {
        let now = Utc::now().to_rfc3339();
        let mut inserted = Vec::with_capacity(members.len());

        // Use a transaction for atomicity
        let mut tx = self.pool.begin().await?;

        for member in members {
            let id = sqlx::query(
                "INSERT INTO team_members (team_id, member_role, member_number, name, phone, email, resume_link, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
            )
            .bind(member.team_id)
            .bind(member.member_role.as_str())
            .bind(i64::from(member.member_number))
            .bind(&member.contact.name)
            .bind(&member.contact.phone)
            .bind(&member.contact.email)
            .bind(&member.contact.resume_link)
            .bind(&now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            inserted.push(Member {
                id,
                team_id: member.team_id,
                member_role: member.member_role,
                member_number: member.member_number,
                name: member.contact.name.clone(),
                phone: member.contact.phone.clone(),
                email: member.contact.email.clone(),
                resume_link: member.contact.resume_link.clone(),
                created_at: now.clone(),
            });
        }

        tx.commit().await?;

        Ok(inserted)
    }

    async fn list_members(&self, team_id: i64) -> Result<Vec<Member>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM team_members WHERE team_id = ? ORDER BY member_number",
            MEMBER_COLUMNS
        ))
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(member_from_row).collect()
    }

    async fn find_leader(&self, team_id: i64) -> Result<Option<Member>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM team_members WHERE team_id = ? AND member_role = 'leader'",
            MEMBER_COLUMNS
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn update_leader(
        &self,
        team_id: i64,
        contact: &MemberContact,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE team_members SET name = ?, phone = ?, email = ?, resume_link = ? WHERE team_id = ? AND member_role = 'leader'"
        )
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(&contact.resume_link)
        .bind(team_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Leader of team {}", team_id)));
        }
        Ok(())
    }

    async fn update_member(
        &self,
        team_id: i64,
        member_number: u8,
        contact: &MemberContact,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE team_members SET name = ?, phone = ?, email = ?, resume_link = ? WHERE team_id = ? AND member_number = ?"
        )
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(&contact.resume_link)
        .bind(team_id)
        .bind(i64::from(member_number))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "Member {} of team {}",
                member_number, team_id
            )));
        }
        Ok(())
    }

    async fn delete_members_above(&self, team_id: i64, team_size: u8) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = ? AND member_number > ?")
            .bind(team_id)
            .bind(i64::from(team_size))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ==================== SUBMISSION OPERATIONS ====================

    async fn find_submission_by_team(
        &self,
        team_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM ppt_submissions WHERE team_id = ?",
            SUBMISSION_COLUMNS
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(submission_from_row))
    }

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM ppt_submissions WHERE id = ?",
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(submission_from_row))
    }

    async fn insert_submission(
        &self,
        submission: &NewSubmission,
    ) -> Result<Submission, StoreError> {
        let now = Utc::now().to_rfc3339();

        let id = sqlx::query(
            "INSERT INTO ppt_submissions (team_id, ppt_file_url, ppt_file_name, file_size_mb, github_link, submitted_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(submission.team_id)
        .bind(&submission.ppt_file_url)
        .bind(&submission.ppt_file_name)
        .bind(&submission.file_size_mb)
        .bind(&submission.github_link)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Submission {
            id,
            team_id: submission.team_id,
            ppt_file_url: submission.ppt_file_url.clone(),
            ppt_file_name: submission.ppt_file_name.clone(),
            file_size_mb: submission.file_size_mb.clone(),
            github_link: submission.github_link.clone(),
            submitted_at: now.clone(),
            updated_at: now,
        })
    }

    async fn update_submission_file(
        &self,
        id: i64,
        update: &SubmissionFileUpdate,
    ) -> Result<Submission, StoreError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE ppt_submissions SET ppt_file_url = ?, ppt_file_name = ?, file_size_mb = ?, github_link = COALESCE(?, github_link), updated_at = ? WHERE id = ?"
        )
        .bind(&update.ppt_file_url)
        .bind(&update.ppt_file_name)
        .bind(&update.file_size_mb)
        .bind(&update.github_link)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Submission {}", id)));
        }

        self.get_submission(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("Submission {}", id)))
    }
}

// Helper functions for row conversion

fn team_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Team, StoreError> {
    let team_size: i64 = row.get("team_size");
    Ok(Team {
        id: row.get("id"),
        team_name: row.get("team_name"),
        team_size: u8::try_from(team_size)
            .map_err(|_| StoreError::Database(format!("Invalid team size {}", team_size)))?,
        track_name: row.get("track_name"),
        payment_receipt_url: row.get("payment_receipt_url"),
        payment_uploaded_at: row.get("payment_uploaded_at"),
        created_at: row.get("created_at"),
    })
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Member, StoreError> {
    let role: String = row.get("member_role");
    let member_number: i64 = row.get("member_number");
    Ok(Member {
        id: row.get("id"),
        team_id: row.get("team_id"),
        member_role: MemberRole::from_str(&role)
            .ok_or_else(|| StoreError::Database(format!("Unknown member role '{}'", role)))?,
        member_number: u8::try_from(member_number).map_err(|_| {
            StoreError::Database(format!("Invalid member number {}", member_number))
        })?,
        name: row.get("name"),
        phone: row.get("phone"),
        email: row.get("email"),
        resume_link: row.get("resume_link"),
        created_at: row.get("created_at"),
    })
}

fn submission_from_row(row: &sqlx::sqlite::SqliteRow) -> Submission {
    Submission {
        id: row.get("id"),
        team_id: row.get("team_id"),
        ppt_file_url: row.get("ppt_file_url"),
        ppt_file_name: row.get("ppt_file_name"),
        file_size_mb: row.get("file_size_mb"),
        github_link: row.get("github_link"),
        submitted_at: row.get("submitted_at"),
        updated_at: row.get("updated_at"),
    }
}
