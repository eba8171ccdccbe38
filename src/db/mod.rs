//! Database module for SQLite persistence.
//!
//! Workflows talk to the [`RecordStore`] trait; [`Repository`] is the SQLite
//! implementation.

mod repository;

pub use repository::*;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{
    Member, MemberContact, NewMember, NewSubmission, Submission, SubmissionFileUpdate, Team,
    TeamRecord,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(String),
    /// A uniqueness constraint rejected the write (team name, member number,
    /// or one submission per team).
    #[error("duplicate value: {0}")]
    Duplicate(String),
    #[error("{0} not found")]
    NotFound(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }
        tracing::error!("Database error: {:?}", err);
        StoreError::Database(err.to_string())
    }
}

/// Equality-filter access to `teams`, `team_members` and `ppt_submissions`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_team_by_name(&self, team_name: &str) -> Result<Option<Team>, StoreError>;

    async fn get_team(&self, id: i64) -> Result<Option<Team>, StoreError>;

    async fn insert_team(&self, team: &TeamRecord) -> Result<Team, StoreError>;

    async fn update_team(&self, id: i64, team: &TeamRecord) -> Result<(), StoreError>;

    async fn set_team_receipt(
        &self,
        id: i64,
        receipt_url: &str,
        uploaded_at: &str,
    ) -> Result<(), StoreError>;

    /// Delete a team; its members go with it.
    async fn delete_team(&self, id: i64) -> Result<(), StoreError>;

    /// Insert all rows or none.
    async fn insert_members(&self, members: &[NewMember]) -> Result<Vec<Member>, StoreError>;

    /// Members of a team ordered by member number.
    async fn list_members(&self, team_id: i64) -> Result<Vec<Member>, StoreError>;

    async fn find_leader(&self, team_id: i64) -> Result<Option<Member>, StoreError>;

    async fn update_leader(&self, team_id: i64, contact: &MemberContact)
        -> Result<(), StoreError>;

    async fn update_member(
        &self,
        team_id: i64,
        member_number: u8,
        contact: &MemberContact,
    ) -> Result<(), StoreError>;

    /// Delete members numbered above `team_size`; returns how many went.
    async fn delete_members_above(&self, team_id: i64, team_size: u8) -> Result<u64, StoreError>;

    async fn find_submission_by_team(&self, team_id: i64)
        -> Result<Option<Submission>, StoreError>;

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, StoreError>;

    async fn insert_submission(&self, submission: &NewSubmission)
        -> Result<Submission, StoreError>;

    async fn update_submission_file(
        &self,
        id: i64,
        update: &SubmissionFileUpdate,
    ) -> Result<Submission, StoreError>;
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_name TEXT NOT NULL UNIQUE,
            team_size INTEGER NOT NULL CHECK (team_size BETWEEN 2 AND 4),
            track_name TEXT NOT NULL,
            payment_receipt_url TEXT,
            payment_uploaded_at TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS team_members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
            member_role TEXT NOT NULL CHECK (member_role IN ('leader', 'member')),
            member_number INTEGER NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            email TEXT NOT NULL,
            resume_link TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (team_id, member_number)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ppt_submissions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            team_id INTEGER NOT NULL UNIQUE REFERENCES teams(id),
            ppt_file_url TEXT NOT NULL,
            ppt_file_name TEXT NOT NULL,
            file_size_mb TEXT NOT NULL,
            github_link TEXT NOT NULL,
            submitted_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_team_members_team_id ON team_members(team_id);
        CREATE INDEX IF NOT EXISTS idx_team_members_role ON team_members(team_id, member_role);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
