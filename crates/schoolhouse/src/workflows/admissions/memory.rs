use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::domain::{Application, ApplicationDecision, ApplicationId, ApprovedUser, RejectedRecord};
use super::intake::normalize_email;
use super::repository::{AdmissionsRepository, RepositoryError};

#[derive(Debug, Default)]
struct AdmissionsState {
    pending: HashMap<ApplicationId, Application>,
    decisions: HashMap<ApplicationId, ApplicationDecision>,
}

impl AdmissionsState {
    fn email_registered(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.pending
            .values()
            .any(|application| normalize_email(&application.email) == email)
            || self.decisions.values().any(|decision| match decision {
                ApplicationDecision::Approved(user) => normalize_email(&user.email) == email,
                ApplicationDecision::Rejected(_) => false,
            })
    }
}

/// Process-local store used by the HTTP service and the test suites.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAdmissionsRepository {
    state: Arc<Mutex<AdmissionsState>>,
}

impl InMemoryAdmissionsRepository {
    fn state(&self) -> MutexGuard<'_, AdmissionsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AdmissionsRepository for InMemoryAdmissionsRepository {
    fn insert_pending(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut state = self.state();
        if state.pending.contains_key(&application.id)
            || state.decisions.contains_key(&application.id)
            || state.email_registered(&application.email)
        {
            return Err(RepositoryError::Conflict);
        }
        state
            .pending
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn email_registered(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self.state().email_registered(email))
    }

    fn fetch_pending(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.state().pending.get(id).cloned())
    }

    fn pending(&self) -> Result<Vec<Application>, RepositoryError> {
        let mut pending: Vec<Application> = self.state().pending.values().cloned().collect();
        pending.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(pending)
    }

    fn approved(&self) -> Result<Vec<ApprovedUser>, RepositoryError> {
        let mut approved: Vec<ApprovedUser> = self
            .state()
            .decisions
            .values()
            .filter_map(|decision| match decision {
                ApplicationDecision::Approved(user) => Some(user.clone()),
                ApplicationDecision::Rejected(_) => None,
            })
            .collect();
        approved.sort_by(|a, b| {
            b.approved_at
                .cmp(&a.approved_at)
                .then_with(|| b.application_id.cmp(&a.application_id))
        });
        Ok(approved)
    }

    fn record_approval(&self, approved: ApprovedUser) -> Result<ApprovedUser, RepositoryError> {
        let mut state = self.state();
        if state.pending.remove(&approved.application_id).is_none() {
            return Err(RepositoryError::Conflict);
        }
        state.decisions.insert(
            approved.application_id.clone(),
            ApplicationDecision::Approved(approved.clone()),
        );
        Ok(approved)
    }

    fn record_rejection(
        &self,
        rejected: RejectedRecord,
    ) -> Result<RejectedRecord, RepositoryError> {
        let mut state = self.state();
        if state.pending.remove(&rejected.application_id).is_none() {
            return Err(RepositoryError::Conflict);
        }
        state.decisions.insert(
            rejected.application_id.clone(),
            ApplicationDecision::Rejected(rejected.clone()),
        );
        Ok(rejected)
    }

    fn decision(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ApplicationDecision>, RepositoryError> {
        Ok(self.state().decisions.get(id).cloned())
    }
}
