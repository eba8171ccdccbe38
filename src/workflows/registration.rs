//! Team registration, lookup and edit.

use std::sync::Arc;

use chrono::Utc;

use super::upload_stamp;
use crate::db::{RecordStore, StoreError};
use crate::errors::AppError;
use crate::form::FormState;
use crate::models::{ExistingTeam, MemberRole, NewMember, Registered};
use crate::storage::{ObjectStorage, UploadedFile};
use crate::validation::{self, FileRule, ResumePolicy};
use crate::wizard::Wizard;

const DUPLICATE_NAME: &str = "This team name is already taken. Please choose a different name.";
const TEAM_NOT_FOUND: &str = "No team found with this ID";
const LEADER_NOT_FOUND: &str = "Team leader not found";

/// Where payment receipts go and what they may be.
#[derive(Debug, Clone)]
pub struct ReceiptSettings {
    pub bucket: String,
    pub rule: FileRule,
}

#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    pub resume_policy: ResumePolicy,
    /// `Some` turns on the payment step.
    pub receipts: Option<ReceiptSettings>,
}

pub struct RegistrationWorkflow {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStorage>,
    settings: RegistrationSettings,
}

impl RegistrationWorkflow {
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStorage>,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            records,
            objects,
            settings,
        }
    }

    pub fn payment_enabled(&self) -> bool {
        self.settings.receipts.is_some()
    }

    /// A fresh step controller configured for this workflow.
    pub fn wizard(&self) -> Wizard {
        Wizard::new(self.payment_enabled(), self.settings.resume_policy)
    }

    /// Register a new team with its leader and members.
    ///
    /// Order: validate, name check, team insert, receipt upload (payment
    /// variant), leader insert, member insert. A failure after the team row
    /// exists removes that row (and the receipt) again.
    pub async fn register(
        &self,
        form: &FormState,
        receipt: Option<&UploadedFile>,
    ) -> Result<Registered, AppError> {
        self.wizard().validate_through(form, receipt.is_some())?;

        let receipt = match (&self.settings.receipts, receipt) {
            (Some(settings), Some(file)) => {
                validation::file_constraint("receipt", file, &settings.rule)?;
                Some((settings, file))
            }
            (None, Some(_)) => {
                tracing::debug!("Ignoring payment receipt, payments are disabled");
                None
            }
            _ => None,
        };

        let record = form.team_record();
        let policy = self.settings.resume_policy;

        let existing = self
            .records
            .find_team_by_name(&record.team_name)
            .await
            .map_err(|e| AppError::store("Team name check failed", e))?;
        if existing.is_some() {
            return Err(AppError::DuplicateName(DUPLICATE_NAME.to_string()));
        }

        let team = self
            .records
            .insert_team(&record)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AppError::DuplicateName(DUPLICATE_NAME.to_string()),
                other => AppError::store("Team creation failed", other),
            })?;
        tracing::debug!(team_id = team.id, "Team row created");

        let mut receipt_key = None;
        if let Some((settings, file)) = receipt {
            match self.attach_receipt(team.id, settings, file).await {
                Ok(key) => receipt_key = Some(key),
                Err(e) => {
                    self.discard_team(team.id, None).await;
                    return Err(e);
                }
            }
        }

        let leader = NewMember::leader(team.id, form.leader.normalized(policy));
        if let Err(e) = self.records.insert_members(&[leader]).await {
            self.discard_team(team.id, receipt_key).await;
            return Err(AppError::store("Leader registration failed", e));
        }

        let members: Vec<NewMember> = form
            .active_members()
            .iter()
            .zip(2u8..)
            .map(|(fields, number)| NewMember::member(team.id, number, fields.normalized(policy)))
            .collect();
        if !members.is_empty() {
            if let Err(e) = self.records.insert_members(&members).await {
                self.discard_team(team.id, receipt_key).await;
                return Err(AppError::store("Members registration failed", e));
            }
        }

        tracing::info!(
            team_id = team.id,
            team_name = %team.team_name,
            team_size = team.team_size,
            "Team registered"
        );

        Ok(Registered { team_id: team.id })
    }

    /// Upload the receipt as `{teamId}_{millis}.{ext}` and record its URL on
    /// the team. Returns the object key.
    async fn attach_receipt(
        &self,
        team_id: i64,
        settings: &ReceiptSettings,
        file: &UploadedFile,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let key = format!("{}_{}.{}", team_id, upload_stamp(now), file.extension());

        self.objects
            .upload(&settings.bucket, &key, &file.bytes, &file.content_type)
            .await
            .map_err(|e| AppError::upload("Receipt upload failed", e))?;

        let url = self.objects.public_url(&settings.bucket, &key);
        if let Err(e) = self
            .records
            .set_team_receipt(team_id, &url, &now.to_rfc3339())
            .await
        {
            self.remove_quietly(&settings.bucket, &key).await;
            return Err(AppError::store("Receipt update failed", e));
        }

        tracing::debug!(team_id, key = %key, "Payment receipt stored");
        Ok(key)
    }

    /// Undo a half-finished registration. Failures are logged, not returned.
    async fn discard_team(&self, team_id: i64, receipt_key: Option<String>) {
        tracing::warn!(team_id, "Registration failed partway, removing team");

        if let Err(e) = self.records.delete_team(team_id).await {
            tracing::error!(team_id, "Failed to remove partial team: {}", e);
        }
        if let (Some(key), Some(settings)) = (receipt_key, &self.settings.receipts) {
            self.remove_quietly(&settings.bucket, &key).await;
        }
    }

    async fn remove_quietly(&self, bucket: &str, key: &str) {
        if let Err(e) = self.objects.remove(bucket, &[key.to_string()]).await {
            tracing::warn!(bucket, key, "Failed to remove object: {}", e);
        }
    }

    /// Fetch a team with its leader and members.
    pub async fn lookup(&self, team_id: i64) -> Result<ExistingTeam, AppError> {
        let team = self
            .records
            .get_team(team_id)
            .await
            .map_err(|e| AppError::store("Error fetching team data", e))?
            .ok_or_else(|| AppError::NotFound(TEAM_NOT_FOUND.to_string()))?;

        let members = self
            .records
            .list_members(team_id)
            .await
            .map_err(|e| AppError::store("Failed to fetch team members", e))?;

        let (leaders, members): (Vec<_>, Vec<_>) = members
            .into_iter()
            .partition(|m| m.member_role == MemberRole::Leader);

        let Some(leader) = leaders.into_iter().next() else {
            tracing::error!(team_id, "Team has no leader row");
            return Err(AppError::LeaderMissing(LEADER_NOT_FOUND.to_string()));
        };

        Ok(ExistingTeam {
            team,
            leader,
            members,
        })
    }

    /// Save edits to a team. Team, leader, then each member in number order;
    /// stops at the first failure and keeps what was already written.
    pub async fn update(&self, team_id: i64, form: &FormState) -> Result<Registered, AppError> {
        self.records
            .get_team(team_id)
            .await
            .map_err(|e| AppError::store("Error fetching team data", e))?
            .ok_or_else(|| AppError::NotFound(TEAM_NOT_FOUND.to_string()))?;

        // Edits never revisit the payment step.
        Wizard::new(false, self.settings.resume_policy).validate_through(form, false)?;

        let record = form.team_record();
        let policy = self.settings.resume_policy;

        let clash = self
            .records
            .find_team_by_name(&record.team_name)
            .await
            .map_err(|e| AppError::store("Team name check failed", e))?;
        if clash.is_some_and(|other| other.id != team_id) {
            return Err(AppError::DuplicateName(DUPLICATE_NAME.to_string()));
        }

        self.records
            .update_team(team_id, &record)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AppError::DuplicateName(DUPLICATE_NAME.to_string()),
                other => AppError::store("Team update failed", other),
            })?;

        self.records
            .update_leader(team_id, &form.leader.normalized(policy))
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => AppError::LeaderMissing(LEADER_NOT_FOUND.to_string()),
                other => AppError::store("Leader update failed", other),
            })?;

        for (fields, number) in form.active_members().iter().zip(2u8..) {
            let contact = fields.normalized(policy);
            let stage = format!("Member {} update failed", number);
            match self.records.update_member(team_id, number, &contact).await {
                Ok(()) => {}
                // The team grew; this member has no row yet.
                Err(StoreError::NotFound(_)) => {
                    self.records
                        .insert_members(&[NewMember::member(team_id, number, contact)])
                        .await
                        .map_err(|e| AppError::store(&stage, e))?;
                }
                Err(e) => return Err(AppError::store(&stage, e)),
            }
        }

        let removed = self
            .records
            .delete_members_above(team_id, record.team_size)
            .await
            .map_err(|e| AppError::store("Member cleanup failed", e))?;
        if removed > 0 {
            tracing::debug!(team_id, removed, "Removed members beyond new team size");
        }

        tracing::info!(team_id, "Team updated");
        Ok(Registered { team_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormAction, MemberField, MemberFields, TeamField};
    use crate::models::NO_RESUME;
    use crate::testing::{FakeObjects, FakeRecords};

    struct Harness {
        records: Arc<FakeRecords>,
        objects: Arc<FakeObjects>,
        workflow: RegistrationWorkflow,
    }

    fn harness(settings: RegistrationSettings) -> Harness {
        let records = Arc::new(FakeRecords::new());
        let objects = Arc::new(FakeObjects::new());
        let workflow = RegistrationWorkflow::new(records.clone(), objects.clone(), settings);
        Harness {
            records,
            objects,
            workflow,
        }
    }

    fn plain() -> Harness {
        harness(RegistrationSettings {
            resume_policy: ResumePolicy::Required,
            receipts: None,
        })
    }

    fn with_payment() -> Harness {
        harness(RegistrationSettings {
            resume_policy: ResumePolicy::Optional,
            receipts: Some(ReceiptSettings {
                bucket: "receipts".to_string(),
                rule: FileRule::receipt(5 * 1024 * 1024),
            }),
        })
    }

    fn person(name: &str) -> MemberFields {
        MemberFields {
            name: format!(" {} ", name),
            phone: "98765 43210".to_string(),
            email: format!("{}@Uni.EDU", name),
            resume_link: format!("https://cv.example/{}", name.to_lowercase()),
        }
    }

    fn form(name: &str, size: u8) -> FormState {
        let mut form = FormState::default();
        form.apply(FormAction::SetTeamField(TeamField::Name(format!("  {}  ", name))));
        form.apply(FormAction::SetTeamField(TeamField::Size(size)));
        form.apply(FormAction::SetTeamField(TeamField::Track(
            "Blockchain & Cybersecurity".to_string(),
        )));
        form.leader = person("Asha");
        form.members = [person("Ben"), person("Chen"), person("Dana")];
        form
    }

    fn receipt() -> UploadedFile {
        UploadedFile::new("upi.png", "image/png", vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_register_creates_team_and_members() {
        let h = plain();

        let registered = h.workflow.register(&form("Null Pointers", 3), None).await.unwrap();

        let teams = h.records.teams();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].id, registered.team_id);
        assert_eq!(teams[0].team_name, "Null Pointers");

        let members = h.records.members();
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].member_role, MemberRole::Leader);
        assert_eq!(members[0].member_number, 1);
        assert_eq!(members[0].name, "Asha");
        assert_eq!(members[0].phone, "9876543210");
        assert_eq!(members[0].email, "asha@uni.edu");
        assert_eq!(members[2].member_number, 3);
        assert_eq!(members[2].name, "Chen");
        assert!(h.objects.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_same_name_twice_is_rejected() {
        let h = plain();
        h.workflow.register(&form("Null Pointers", 2), None).await.unwrap();

        let err = h
            .workflow
            .register(&form("Null Pointers ", 2), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateName(_)));
        assert_eq!(h.records.teams().len(), 1);
        assert_eq!(
            h.records.calls().iter().filter(|c| *c == "insert_team").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_invalid_member_never_reaches_store() {
        let h = plain();
        let mut form = form("Null Pointers", 2);
        form.apply(FormAction::SetMemberField(0, MemberField::Phone, "123".to_string()));

        let err = h.workflow.register(&form, None).await.unwrap_err();

        let message = err.message();
        assert!(message.contains("Member 2"));
        assert!(message.contains("phone"));
        assert!(h.records.calls().is_empty());
    }

    #[tokio::test]
    async fn test_team_insert_failure() {
        let h = plain();
        h.records.fail("insert_team");

        let err = h.workflow.register(&form("Null Pointers", 2), None).await.unwrap_err();

        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(err.message(), "Team creation failed: insert_team unavailable");
        assert!(!h.records.calls().contains(&"insert_leader".to_string()));
    }

    #[tokio::test]
    async fn test_leader_failure_removes_team() {
        let h = plain();
        h.records.fail("insert_leader");

        let err = h.workflow.register(&form("Null Pointers", 2), None).await.unwrap_err();

        assert!(err.message().starts_with("Leader registration failed"));
        assert!(h.records.teams().is_empty());
        assert!(h.records.calls().contains(&"delete_team".to_string()));
    }

    #[tokio::test]
    async fn test_members_failure_removes_team_and_leader() {
        let h = plain();
        h.records.fail("insert_members");

        let err = h.workflow.register(&form("Null Pointers", 4), None).await.unwrap_err();

        assert!(err.message().starts_with("Members registration failed"));
        assert!(h.records.teams().is_empty());
        assert!(h.records.members().is_empty());
    }

    #[tokio::test]
    async fn test_payment_variant_uploads_receipt_before_leader() {
        let h = with_payment();

        let registered = h
            .workflow
            .register(&form("Null Pointers", 2), Some(&receipt()))
            .await
            .unwrap();

        let calls = h.records.calls();
        let receipt_at = calls.iter().position(|c| c == "set_team_receipt").unwrap();
        let leader_at = calls.iter().position(|c| c == "insert_leader").unwrap();
        assert!(receipt_at < leader_at);

        let keys = h.objects.keys("receipts");
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with(&format!("{}_", registered.team_id)));
        assert!(keys[0].ends_with(".png"));

        let team = &h.records.teams()[0];
        assert_eq!(
            team.payment_receipt_url.as_deref(),
            Some(format!("https://files.test/storage/receipts/{}", keys[0]).as_str())
        );
        assert!(team.payment_uploaded_at.is_some());
    }

    #[tokio::test]
    async fn test_payment_variant_requires_receipt() {
        let h = with_payment();

        let err = h.workflow.register(&form("Null Pointers", 2), None).await.unwrap_err();

        match err {
            AppError::Validation(invalid) => assert_eq!(invalid.field, "receipt"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(h.records.calls().is_empty());
    }

    #[tokio::test]
    async fn test_receipt_upload_failure_stops_before_members() {
        let h = with_payment();
        h.objects.fail("upload");

        let err = h
            .workflow
            .register(&form("Null Pointers", 2), Some(&receipt()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upload(_)));
        assert!(err.message().starts_with("Receipt upload failed"));
        assert!(h.records.members().is_empty());
        assert!(h.records.teams().is_empty());
        assert!(!h.records.calls().contains(&"insert_leader".to_string()));
    }

    #[tokio::test]
    async fn test_receipt_removed_when_members_fail() {
        let h = with_payment();
        h.records.fail("insert_members");

        h.workflow
            .register(&form("Null Pointers", 3), Some(&receipt()))
            .await
            .unwrap_err();

        assert!(h.objects.keys("receipts").is_empty());
        assert!(h.objects.calls().iter().any(|c| c.starts_with("remove:receipts/")));
    }

    #[tokio::test]
    async fn test_receipt_must_be_an_image() {
        let h = with_payment();
        let pdf = UploadedFile::new("receipt.pdf", "application/pdf", vec![1]);

        let err = h
            .workflow
            .register(&form("Null Pointers", 2), Some(&pdf))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(h.objects.calls().is_empty());
    }

    #[tokio::test]
    async fn test_optional_resume_stored_as_sentinel() {
        let h = with_payment();
        let mut form = form("Null Pointers", 2);
        form.apply(FormAction::SetMemberField(0, MemberField::ResumeLink, " ".to_string()));

        h.workflow.register(&form, Some(&receipt())).await.unwrap();

        assert_eq!(h.records.members()[1].resume_link, NO_RESUME);
    }

    #[tokio::test]
    async fn test_lookup_partitions_leader() {
        let h = plain();
        let id = h
            .workflow
            .register(&form("Null Pointers", 3), None)
            .await
            .unwrap()
            .team_id;

        let existing = h.workflow.lookup(id).await.unwrap();
        assert_eq!(existing.leader.name, "Asha");
        let names: Vec<&str> = existing.members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Ben", "Chen"]);
    }

    #[tokio::test]
    async fn test_lookup_missing_team() {
        let h = plain();
        let err = h.workflow.lookup(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), "No team found with this ID");
    }

    #[tokio::test]
    async fn test_lookup_without_leader() {
        let h = plain();
        let id = h
            .workflow
            .register(&form("Null Pointers", 2), None)
            .await
            .unwrap()
            .team_id;
        h.records
            .remove_members_where(|m| m.member_role != MemberRole::Leader);

        let err = h.workflow.lookup(id).await.unwrap_err();
        assert!(matches!(err, AppError::LeaderMissing(_)));
    }

    #[tokio::test]
    async fn test_lookup_then_update_is_idempotent() {
        let h = with_payment();
        let mut original = form("Null Pointers", 3);
        original.apply(FormAction::SetMemberField(1, MemberField::ResumeLink, String::new()));
        let id = h
            .workflow
            .register(&original, Some(&receipt()))
            .await
            .unwrap()
            .team_id;
        let teams_before = h.records.teams();
        let members_before = h.records.members();

        let loaded = FormState::from(h.workflow.lookup(id).await.unwrap());
        h.workflow.update(id, &loaded).await.unwrap();

        assert_eq!(h.records.teams(), teams_before);
        assert_eq!(h.records.members(), members_before);
    }

    #[tokio::test]
    async fn test_update_changes_rows_in_order() {
        let h = plain();
        let id = h
            .workflow
            .register(&form("Null Pointers", 3), None)
            .await
            .unwrap()
            .team_id;

        let mut edited = FormState::from(h.workflow.lookup(id).await.unwrap());
        edited.apply(FormAction::SetTeamField(TeamField::Name("Segfault Squad".to_string())));
        edited.apply(FormAction::SetMemberField(1, MemberField::Name, "Chen Li".to_string()));
        h.workflow.update(id, &edited).await.unwrap();

        assert_eq!(h.records.teams()[0].team_name, "Segfault Squad");
        assert_eq!(h.records.members()[2].name, "Chen Li");

        let calls = h.records.calls();
        let tail: Vec<&str> = calls
            .iter()
            .map(String::as_str)
            .filter(|c| c.starts_with("update_"))
            .collect();
        assert_eq!(
            tail,
            vec!["update_team", "update_leader", "update_member", "update_member"]
        );
    }

    #[tokio::test]
    async fn test_update_stops_at_first_failure() {
        let h = plain();
        let id = h
            .workflow
            .register(&form("Null Pointers", 2), None)
            .await
            .unwrap()
            .team_id;
        h.records.fail("update_leader");

        let mut edited = FormState::from(h.workflow.lookup(id).await.unwrap());
        edited.apply(FormAction::SetTeamField(TeamField::Name("Renamed".to_string())));
        let err = h.workflow.update(id, &edited).await.unwrap_err();

        assert!(err.message().starts_with("Leader update failed"));
        // The team row change stays committed.
        assert_eq!(h.records.teams()[0].team_name, "Renamed");
        assert!(!h.records.calls().contains(&"update_member".to_string()));
    }

    #[tokio::test]
    async fn test_update_rejects_name_of_other_team() {
        let h = plain();
        h.workflow.register(&form("Alpha", 2), None).await.unwrap();
        let id = h.workflow.register(&form("Beta", 2), None).await.unwrap().team_id;

        let mut edited = FormState::from(h.workflow.lookup(id).await.unwrap());
        edited.apply(FormAction::SetTeamField(TeamField::Name("Alpha".to_string())));
        let err = h.workflow.update(id, &edited).await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateName(_)));
    }

    #[tokio::test]
    async fn test_update_resizes_member_rows() {
        let h = plain();
        let id = h
            .workflow
            .register(&form("Null Pointers", 2), None)
            .await
            .unwrap()
            .team_id;

        let mut grown = FormState::from(h.workflow.lookup(id).await.unwrap());
        grown.apply(FormAction::SetTeamField(TeamField::Size(4)));
        grown.members[1] = person("Chen");
        grown.members[2] = person("Dana");
        h.workflow.update(id, &grown).await.unwrap();
        assert_eq!(h.records.members().len(), 4);

        let mut shrunk = FormState::from(h.workflow.lookup(id).await.unwrap());
        shrunk.apply(FormAction::SetTeamField(TeamField::Size(3)));
        h.workflow.update(id, &shrunk).await.unwrap();
        let numbers: Vec<u8> = h.records.members().iter().map(|m| m.member_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_unknown_team() {
        let h = plain();
        let err = h.workflow.update(42, &form("Ghosts", 2)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
