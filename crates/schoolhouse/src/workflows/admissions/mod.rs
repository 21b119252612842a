//! Application intake, the pending review queue and approval decisions.
//!
//! Applications enter through [`AdmissionsService::submit`], wait in the pending set and leave it
//! exactly once, either as an [`ApprovedUser`] carrying class/subject/student assignments or as a
//! [`RejectedRecord`].

pub mod decision;
pub mod domain;
pub mod import;
pub mod intake;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use decision::{
    AssignmentSelection, DecisionEngine, DecisionViolation, DEFAULT_REJECTION_REASON,
};
pub use domain::{
    ApplicantRole, Application, ApplicationDecision, ApplicationId, ApplicationSubmission,
    ApprovedUser, Assignments, DecisionStatus, ParentDetails, RejectedRecord, RoleDetails,
    TeacherDetails, GRADE_LEVELS, SUBJECTS,
};
pub use import::{parse_roster, ImportSummary, RosterEntry, RosterImportError, RowRejection};
pub use intake::{ApplicationDraft, IntakeGuard, IntakeViolation, SUBMISSION_CONFIRMATION};
pub use memory::InMemoryAdmissionsRepository;
pub use repository::{
    AdmissionsRepository, ApplicationStatusView, DecisionNotice, DecisionNotifier,
    NotificationError, RepositoryError,
};
pub use router::admissions_router;
pub use service::{AdmissionsError, AdmissionsService};
