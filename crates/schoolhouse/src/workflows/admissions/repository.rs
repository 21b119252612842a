use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicantRole, Application, ApplicationDecision, ApplicationId, ApprovedUser, DecisionStatus,
    RejectedRecord,
};
pub use crate::workflows::persistence::RepositoryError;

/// Storage abstraction for pending applications and their terminal decisions.
///
/// Implementations must make `insert_pending` and the two `record_*` calls atomic: the email
/// check and insert happen together, and a decision only lands if the application is still
/// pending (otherwise `RepositoryError::Conflict`).
pub trait AdmissionsRepository: Send + Sync {
    /// Store a new pending application. `Conflict` when the email is pending or approved.
    fn insert_pending(&self, application: Application) -> Result<Application, RepositoryError>;
    /// Whether the normalised email belongs to a pending application or an approved user.
    fn email_registered(&self, email: &str) -> Result<bool, RepositoryError>;
    fn fetch_pending(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    /// All pending applications, newest first.
    fn pending(&self) -> Result<Vec<Application>, RepositoryError>;
    /// All approved users, most recent approval first.
    fn approved(&self) -> Result<Vec<ApprovedUser>, RepositoryError>;
    fn record_approval(&self, approved: ApprovedUser) -> Result<ApprovedUser, RepositoryError>;
    fn record_rejection(&self, rejected: RejectedRecord)
        -> Result<RejectedRecord, RepositoryError>;
    fn decision(&self, id: &ApplicationId)
        -> Result<Option<ApplicationDecision>, RepositoryError>;
}

/// Outbound hook for applicant-facing notices (e-mail, SMS adapters).
pub trait DecisionNotifier: Send + Sync {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError>;
}

/// Payload handed to the notifier so adapters can pick a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNotice {
    pub template: String,
    pub application_id: ApplicationId,
    pub recipient: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification channel unavailable: {0}")]
    Transport(String),
}

/// Public status of an application, whichever state it is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    pub role: ApplicantRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ApplicationStatusView {
    pub fn pending(application: &Application) -> Self {
        Self {
            application_id: application.id.clone(),
            status: DecisionStatus::Pending.label(),
            role: application.role(),
            reason: None,
        }
    }

    pub fn decided(decision: &ApplicationDecision) -> Self {
        match decision {
            ApplicationDecision::Approved(user) => Self {
                application_id: user.application_id.clone(),
                status: DecisionStatus::Approved.label(),
                role: user.role,
                reason: None,
            },
            ApplicationDecision::Rejected(record) => Self {
                application_id: record.application_id.clone(),
                status: DecisionStatus::Rejected.label(),
                role: record.role,
                reason: Some(record.reason.clone()),
            },
        }
    }
}
