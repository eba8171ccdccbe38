//! In-memory record store and object storage for workflow tests.
//!
//! Both fakes log every call by operation name and can be told to fail a
//! given operation.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::db::{RecordStore, StoreError};
use crate::models::{
    Member, MemberContact, MemberRole, NewMember, NewSubmission, Submission,
    SubmissionFileUpdate, Team, TeamRecord,
};
use crate::storage::{ObjectStorage, StorageError};

const NOW: &str = "2026-03-01T10:00:00+00:00";

#[derive(Default)]
struct RecordsState {
    teams: Vec<Team>,
    members: Vec<Member>,
    submissions: Vec<Submission>,
    next_id: i64,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
}

impl RecordsState {
    fn enter(&mut self, op: &'static str) -> Result<(), StoreError> {
        self.calls.push(op.to_string());
        if self.failing.contains(op) {
            return Err(StoreError::Database(format!("{} unavailable", op)));
        }
        Ok(())
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct FakeRecords {
    state: Mutex<RecordsState>,
}

impl FakeRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn teams(&self) -> Vec<Team> {
        self.state.lock().unwrap().teams.clone()
    }

    pub fn members(&self) -> Vec<Member> {
        self.state.lock().unwrap().members.clone()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    /// Drop stored rows directly, bypassing the trait.
    pub fn remove_members_where(&self, keep: impl Fn(&Member) -> bool) {
        self.state.lock().unwrap().members.retain(|m| keep(m));
    }
}

fn apply_contact(member: &mut Member, contact: &MemberContact) {
    member.name = contact.name.clone();
    member.phone = contact.phone.clone();
    member.email = contact.email.clone();
    member.resume_link = contact.resume_link.clone();
}

#[async_trait]
impl RecordStore for FakeRecords {
    async fn find_team_by_name(&self, team_name: &str) -> Result<Option<Team>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("find_team_by_name")?;
        Ok(state.teams.iter().find(|t| t.team_name == team_name).cloned())
    }

    async fn get_team(&self, id: i64) -> Result<Option<Team>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("get_team")?;
        Ok(state.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_team(&self, team: &TeamRecord) -> Result<Team, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("insert_team")?;
        if state.teams.iter().any(|t| t.team_name == team.team_name) {
            return Err(StoreError::Duplicate("teams.team_name".to_string()));
        }
        let team = Team {
            id: state.next_id(),
            team_name: team.team_name.clone(),
            team_size: team.team_size,
            track_name: team.track_name.clone(),
            payment_receipt_url: None,
            payment_uploaded_at: None,
            created_at: NOW.to_string(),
        };
        state.teams.push(team.clone());
        Ok(team)
    }

    async fn update_team(&self, id: i64, record: &TeamRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("update_team")?;
        if state
            .teams
            .iter()
            .any(|t| t.id != id && t.team_name == record.team_name)
        {
            return Err(StoreError::Duplicate("teams.team_name".to_string()));
        }
        let team = state
            .teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Team {}", id)))?;
        team.team_name = record.team_name.clone();
        team.team_size = record.team_size;
        team.track_name = record.track_name.clone();
        Ok(())
    }

    async fn set_team_receipt(
        &self,
        id: i64,
        receipt_url: &str,
        uploaded_at: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("set_team_receipt")?;
        let team = state
            .teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Team {}", id)))?;
        team.payment_receipt_url = Some(receipt_url.to_string());
        team.payment_uploaded_at = Some(uploaded_at.to_string());
        Ok(())
    }

    async fn delete_team(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("delete_team")?;
        state.teams.retain(|t| t.id != id);
        state.members.retain(|m| m.team_id != id);
        Ok(())
    }

    async fn insert_members(&self, members: &[NewMember]) -> Result<Vec<Member>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let op = match members.first().map(|m| m.member_role) {
            Some(MemberRole::Leader) => "insert_leader",
            _ => "insert_members",
        };
        state.enter(op)?;
        for new in members {
            if state
                .members
                .iter()
                .any(|m| m.team_id == new.team_id && m.member_number == new.member_number)
            {
                return Err(StoreError::Duplicate("team_members.member_number".to_string()));
            }
        }
        let mut inserted = Vec::new();
        for new in members {
            let member = Member {
                id: state.next_id(),
                team_id: new.team_id,
                member_role: new.member_role,
                member_number: new.member_number,
                name: new.contact.name.clone(),
                phone: new.contact.phone.clone(),
                email: new.contact.email.clone(),
                resume_link: new.contact.resume_link.clone(),
                created_at: NOW.to_string(),
            };
            state.members.push(member.clone());
            inserted.push(member);
        }
        Ok(inserted)
    }

    async fn list_members(&self, team_id: i64) -> Result<Vec<Member>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("list_members")?;
        let mut members: Vec<Member> = state
            .members
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.member_number);
        Ok(members)
    }

    async fn find_leader(&self, team_id: i64) -> Result<Option<Member>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("find_leader")?;
        Ok(state
            .members
            .iter()
            .find(|m| m.team_id == team_id && m.member_role == MemberRole::Leader)
            .cloned())
    }

    async fn update_leader(
        &self,
        team_id: i64,
        contact: &MemberContact,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("update_leader")?;
        let leader = state
            .members
            .iter_mut()
            .find(|m| m.team_id == team_id && m.member_role == MemberRole::Leader)
            .ok_or_else(|| StoreError::NotFound(format!("Leader of team {}", team_id)))?;
        apply_contact(leader, contact);
        Ok(())
    }

    async fn update_member(
        &self,
        team_id: i64,
        member_number: u8,
        contact: &MemberContact,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("update_member")?;
        let member = state
            .members
            .iter_mut()
            .find(|m| m.team_id == team_id && m.member_number == member_number)
            .ok_or_else(|| StoreError::NotFound(format!("Member {}", member_number)))?;
        apply_contact(member, contact);
        Ok(())
    }

    async fn delete_members_above(&self, team_id: i64, team_size: u8) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("delete_members_above")?;
        let before = state.members.len();
        state
            .members
            .retain(|m| m.team_id != team_id || m.member_number <= team_size);
        Ok((before - state.members.len()) as u64)
    }

    async fn find_submission_by_team(
        &self,
        team_id: i64,
    ) -> Result<Option<Submission>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("find_submission_by_team")?;
        Ok(state.submissions.iter().find(|s| s.team_id == team_id).cloned())
    }

    async fn get_submission(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("get_submission")?;
        Ok(state.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn insert_submission(
        &self,
        new: &NewSubmission,
    ) -> Result<Submission, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("insert_submission")?;
        if state.submissions.iter().any(|s| s.team_id == new.team_id) {
            return Err(StoreError::Duplicate("ppt_submissions.team_id".to_string()));
        }
        let submission = Submission {
            id: state.next_id(),
            team_id: new.team_id,
            ppt_file_url: new.ppt_file_url.clone(),
            ppt_file_name: new.ppt_file_name.clone(),
            file_size_mb: new.file_size_mb.clone(),
            github_link: new.github_link.clone(),
            submitted_at: NOW.to_string(),
            updated_at: NOW.to_string(),
        };
        state.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn update_submission_file(
        &self,
        id: i64,
        update: &SubmissionFileUpdate,
    ) -> Result<Submission, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.enter("update_submission_file")?;
        let submission = state
            .submissions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Submission {}", id)))?;
        submission.ppt_file_url = update.ppt_file_url.clone();
        submission.ppt_file_name = update.ppt_file_name.clone();
        submission.file_size_mb = update.file_size_mb.clone();
        if let Some(link) = &update.github_link {
            submission.github_link = link.clone();
        }
        Ok(submission.clone())
    }
}

#[derive(Default)]
struct ObjectsState {
    objects: BTreeMap<(String, String), Vec<u8>>,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
}

#[derive(Default)]
pub struct FakeObjects {
    state: Mutex<ObjectsState>,
}

impl FakeObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    /// Calls as `op:bucket/key`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    pub fn put(&self, bucket: &str, key: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert((bucket.to_string(), key.to_string()), Vec::new());
    }
}

#[async_trait]
impl ObjectStorage for FakeObjects {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("upload:{}/{}", bucket, key));
        if state.failing.contains("upload") {
            return Err(StorageError::Io(std::io::Error::other("bucket offline")));
        }
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), bytes.to_vec());
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("https://files.test/storage/{}/{}", bucket, key)
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        for key in keys {
            state.calls.push(format!("remove:{}/{}", bucket, key));
        }
        if state.failing.contains("remove") {
            return Err(StorageError::Io(std::io::Error::other("bucket offline")));
        }
        for key in keys {
            state.objects.remove(&(bucket.to_string(), key.clone()));
        }
        Ok(())
    }
}
