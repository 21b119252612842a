use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::admissions::domain::{
    Application, ApplicationDecision, ApplicationId, ApplicationSubmission, ApprovedUser,
    ParentDetails, RejectedRecord, RoleDetails, TeacherDetails,
};
use crate::workflows::admissions::repository::{
    AdmissionsRepository, DecisionNotice, DecisionNotifier, NotificationError, RepositoryError,
};
use crate::workflows::admissions::{
    admissions_router, AdmissionsService, InMemoryAdmissionsRepository,
};
use crate::workflows::identity::ActorId;

pub(super) fn teacher_submission(email: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        full_name: "Tara Teacher".to_string(),
        email: email.to_string(),
        phone: Some("+1 555 0100".to_string()),
        details: RoleDetails::Teacher(TeacherDetails {
            qualifications: "MSc Physics".to_string(),
            experience: "Six years teaching secondary physics".to_string(),
            subjects: vec!["Physics".to_string()],
            preferred_classes: vec!["Grade 11".to_string()],
        }),
        additional_info: None,
    }
}

pub(super) fn student_submission(email: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        full_name: "Sam Student".to_string(),
        email: email.to_string(),
        phone: None,
        details: RoleDetails::Student,
        additional_info: Some("Moving from another district".to_string()),
    }
}

pub(super) fn parent_submission(email: &str, linked_student: Option<&str>) -> ApplicationSubmission {
    ApplicationSubmission {
        full_name: "Pat Parent".to_string(),
        email: email.to_string(),
        phone: None,
        details: RoleDetails::Parent(ParentDetails {
            linked_student_id: linked_student.map(str::to_string),
        }),
        additional_info: None,
    }
}

pub(super) fn reviewer() -> ActorId {
    ActorId::new("reviewer-1")
}

pub(super) type TestService = AdmissionsService<InMemoryAdmissionsRepository, MemoryNotifier>;

pub(super) fn build_service() -> (
    TestService,
    Arc<InMemoryAdmissionsRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(InMemoryAdmissionsRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = AdmissionsService::new(repository.clone(), notifier.clone());
    (service, repository, notifier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<DecisionNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn templates(&self) -> Vec<String> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .iter()
            .map(|notice| notice.template.clone())
            .collect()
    }
}

impl DecisionNotifier for MemoryNotifier {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct OfflineNotifier;

impl DecisionNotifier for OfflineNotifier {
    fn publish(&self, _notice: DecisionNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl AdmissionsRepository for UnavailableRepository {
    fn insert_pending(&self, _application: Application) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn email_registered(&self, _email: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    fn fetch_pending(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn approved(&self) -> Result<Vec<ApprovedUser>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_approval(&self, _approved: ApprovedUser) -> Result<ApprovedUser, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_rejection(
        &self,
        _rejected: RejectedRecord,
    ) -> Result<RejectedRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn decision(
        &self,
        _id: &ApplicationId,
    ) -> Result<Option<ApplicationDecision>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Lets a test decide an application behind the service's back, as a second reviewer would.
pub(super) struct RacingRepository {
    pub(super) inner: InMemoryAdmissionsRepository,
    pub(super) rival: Mutex<Option<RejectedRecord>>,
}

impl AdmissionsRepository for RacingRepository {
    fn insert_pending(&self, application: Application) -> Result<Application, RepositoryError> {
        self.inner.insert_pending(application)
    }

    fn email_registered(&self, email: &str) -> Result<bool, RepositoryError> {
        self.inner.email_registered(email)
    }

    fn fetch_pending(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_pending(id)
    }

    fn pending(&self) -> Result<Vec<Application>, RepositoryError> {
        self.inner.pending()
    }

    fn approved(&self) -> Result<Vec<ApprovedUser>, RepositoryError> {
        self.inner.approved()
    }

    fn record_approval(&self, approved: ApprovedUser) -> Result<ApprovedUser, RepositoryError> {
        let rival = self.rival.lock().expect("rival mutex poisoned").take();
        if let Some(rejected) = rival {
            self.inner.record_rejection(rejected)?;
        }
        self.inner.record_approval(approved)
    }

    fn record_rejection(
        &self,
        rejected: RejectedRecord,
    ) -> Result<RejectedRecord, RepositoryError> {
        self.inner.record_rejection(rejected)
    }

    fn decision(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationDecision>, RepositoryError> {
        self.inner.decision(id)
    }
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    admissions_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
