use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use super::decision::{DecisionEngine, DecisionViolation};
use super::domain::{
    ApplicantRole, Application, ApplicationDecision, ApplicationId, ApplicationSubmission,
    ApprovedUser, Assignments, DecisionStatus, RejectedRecord,
};
use super::intake::{IntakeGuard, IntakeViolation};
use super::repository::{
    AdmissionsRepository, ApplicationStatusView, DecisionNotice, DecisionNotifier,
    RepositoryError,
};
use crate::workflows::identity::ActorId;

/// Service composing intake validation, the decision rules and the repository.
pub struct AdmissionsService<R, N> {
    guard: IntakeGuard,
    engine: DecisionEngine,
    repository: Arc<R>,
    notifier: Arc<N>,
    in_flight: Mutex<HashSet<ApplicationId>>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

impl<R, N> AdmissionsService<R, N>
where
    R: AdmissionsRepository + 'static,
    N: DecisionNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>) -> Self {
        Self {
            guard: IntakeGuard,
            engine: DecisionEngine,
            repository,
            notifier,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Whether `assignments` would let the pending application `id` be approved. Reviewer
    /// screens use it to enable the approve action.
    pub fn can_approve(
        &self,
        id: &ApplicationId,
        assignments: &Assignments,
    ) -> Result<bool, AdmissionsError> {
        match self.repository.fetch_pending(id)? {
            Some(application) => Ok(self.engine.can_approve(&application, assignments)),
            None => match self.repository.decision(id)? {
                Some(_) => Ok(false),
                None => Err(AdmissionsError::NotFound(id.clone())),
            },
        }
    }

    /// Validate and store a new application in the pending set.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Application, AdmissionsError> {
        let submission = self.guard.validate(submission)?;

        if self.repository.email_registered(&submission.email)? {
            warn!(role = submission.details.role().label(), "duplicate application refused");
            return Err(AdmissionsError::DuplicateEmail {
                email: submission.email,
            });
        }

        let email = submission.email.clone();
        let application = Application {
            id: next_application_id(),
            full_name: submission.full_name,
            email: submission.email,
            phone: submission.phone,
            details: submission.details,
            additional_info: submission.additional_info,
            submitted_at: Utc::now(),
        };

        let stored = self
            .repository
            .insert_pending(application)
            .map_err(|err| match err {
                RepositoryError::Conflict => AdmissionsError::DuplicateEmail { email },
                other => AdmissionsError::Persistence(other),
            })?;

        info!(
            application_id = %stored.id,
            role = stored.role().label(),
            "application submitted"
        );

        let mut details = BTreeMap::new();
        details.insert("role".to_string(), stored.role().label().to_string());
        self.notify(DecisionNotice {
            template: "application_received".to_string(),
            application_id: stored.id.clone(),
            recipient: stored.email.clone(),
            details,
        });

        Ok(stored)
    }

    /// Pending applications, newest first.
    pub fn list_pending(&self) -> Result<Vec<Application>, AdmissionsError> {
        Ok(self.repository.pending()?)
    }

    /// Pending applications grouped for reviewers; every role is present, possibly empty.
    pub fn pending_by_role(
        &self,
    ) -> Result<BTreeMap<ApplicantRole, Vec<Application>>, AdmissionsError> {
        let mut grouped: BTreeMap<ApplicantRole, Vec<Application>> = ApplicantRole::ALL
            .into_iter()
            .map(|role| (role, Vec::new()))
            .collect();
        for application in self.repository.pending()? {
            grouped
                .entry(application.role())
                .or_default()
                .push(application);
        }
        Ok(grouped)
    }

    pub fn list_approved(&self) -> Result<Vec<ApprovedUser>, AdmissionsError> {
        Ok(self.repository.approved()?)
    }

    pub fn status(&self, id: &ApplicationId) -> Result<ApplicationStatusView, AdmissionsError> {
        if let Some(application) = self.repository.fetch_pending(id)? {
            return Ok(ApplicationStatusView::pending(&application));
        }
        match self.repository.decision(id)? {
            Some(decision) => Ok(ApplicationStatusView::decided(&decision)),
            None => Err(AdmissionsError::NotFound(id.clone())),
        }
    }

    /// Approve a pending application with the reviewer's assignments.
    ///
    /// Approving an already approved application returns the stored record unchanged.
    pub fn approve(
        &self,
        id: &ApplicationId,
        assignments: Assignments,
        approver: &ActorId,
    ) -> Result<ApprovedUser, AdmissionsError> {
        let _ticket = self.begin_decision(id)?;

        let Some(application) = self.repository.fetch_pending(id)? else {
            return self.existing_approval(id);
        };

        let approved = match self
            .engine
            .approve(&application, assignments, approver, Utc::now())
        {
            Ok(approved) => approved,
            Err(violation) => {
                warn!(application_id = %id, %violation, "approval refused");
                return Err(violation.into());
            }
        };

        let approved = match self.repository.record_approval(approved) {
            Ok(approved) => approved,
            Err(RepositoryError::Conflict) => return self.existing_approval(id),
            Err(err) => return Err(err.into()),
        };

        info!(
            application_id = %id,
            role = approved.role.label(),
            approver = %approver,
            classes = approved.assigned_classes.len(),
            "application approved"
        );

        let mut details = BTreeMap::new();
        details.insert("role".to_string(), approved.role.label().to_string());
        details.insert("classes".to_string(), approved.assigned_classes.join(", "));
        details.insert("subjects".to_string(), approved.assigned_subjects.join(", "));
        self.notify(DecisionNotice {
            template: "application_approved".to_string(),
            application_id: id.clone(),
            recipient: approved.email.clone(),
            details,
        });

        Ok(approved)
    }

    /// Reject a pending application; a missing or blank reason falls back to the default.
    ///
    /// Rejecting an already rejected application returns the stored record unchanged.
    pub fn reject(
        &self,
        id: &ApplicationId,
        reason: Option<String>,
        reviewer: &ActorId,
    ) -> Result<RejectedRecord, AdmissionsError> {
        let _ticket = self.begin_decision(id)?;

        let Some(application) = self.repository.fetch_pending(id)? else {
            return self.existing_rejection(id);
        };

        let rejected = self
            .engine
            .reject(&application, reason, reviewer, Utc::now());

        let rejected = match self.repository.record_rejection(rejected) {
            Ok(rejected) => rejected,
            Err(RepositoryError::Conflict) => return self.existing_rejection(id),
            Err(err) => return Err(err.into()),
        };

        info!(application_id = %id, reviewer = %reviewer, "application rejected");

        let mut details = BTreeMap::new();
        details.insert("reason".to_string(), rejected.reason.clone());
        self.notify(DecisionNotice {
            template: "application_rejected".to_string(),
            application_id: id.clone(),
            recipient: rejected.email.clone(),
            details,
        });

        Ok(rejected)
    }

    fn existing_approval(&self, id: &ApplicationId) -> Result<ApprovedUser, AdmissionsError> {
        match self.repository.decision(id)? {
            Some(ApplicationDecision::Approved(user)) => {
                debug!(application_id = %id, "approval repeated on approved application");
                Ok(user)
            }
            Some(decision) => Err(AdmissionsError::AlreadyDecided {
                id: id.clone(),
                status: decision.status(),
            }),
            None => Err(AdmissionsError::NotFound(id.clone())),
        }
    }

    fn existing_rejection(&self, id: &ApplicationId) -> Result<RejectedRecord, AdmissionsError> {
        match self.repository.decision(id)? {
            Some(ApplicationDecision::Rejected(record)) => {
                debug!(application_id = %id, "rejection repeated on rejected application");
                Ok(record)
            }
            Some(decision) => Err(AdmissionsError::AlreadyDecided {
                id: id.clone(),
                status: decision.status(),
            }),
            None => Err(AdmissionsError::NotFound(id.clone())),
        }
    }

    pub(crate) fn begin_decision(
        &self,
        id: &ApplicationId,
    ) -> Result<DecisionTicket<'_>, AdmissionsError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(id.clone()) {
            return Err(AdmissionsError::DecisionInFlight(id.clone()));
        }
        Ok(DecisionTicket {
            in_flight: &self.in_flight,
            id: id.clone(),
        })
    }

    fn notify(&self, notice: DecisionNotice) {
        let template = notice.template.clone();
        if let Err(err) = self.notifier.publish(notice) {
            warn!(%template, error = %err, "notification dispatch failed");
        }
    }
}

/// Marks an application as having a decision in progress until dropped.
pub(crate) struct DecisionTicket<'a> {
    in_flight: &'a Mutex<HashSet<ApplicationId>>,
    id: ApplicationId,
}

impl Drop for DecisionTicket<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Error raised by the admissions service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionsError {
    #[error(transparent)]
    Validation(#[from] IntakeViolation),
    #[error("an application or account already exists for {email}")]
    DuplicateEmail { email: String },
    #[error(transparent)]
    Precondition(#[from] DecisionViolation),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("application {id} was already {status}")]
    AlreadyDecided {
        id: ApplicationId,
        status: DecisionStatus,
    },
    #[error("a decision for application {0} is already in progress")]
    DecisionInFlight(ApplicationId),
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}
