use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::domain::{FeatureFlag, ProvisionedTenant, Tenant, TenantDraft, TenantId};
use super::repository::{RepositoryError, TenantRepository};
use super::slug::unique_slug;
use super::wizard::{FieldEdit, OnboardingForm, OnboardingStep, OnboardingWizard, WizardError};
use crate::workflows::identity::ActorId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TENANT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("onb-{id:06}"))
}

fn next_tenant_id() -> TenantId {
    let id = TENANT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TenantId(format!("tenant-{id:06}"))
}

#[derive(Debug)]
struct WizardSession {
    owner: ActorId,
    wizard: OnboardingWizard,
    completing: bool,
    /// Tenant row written by an earlier completion attempt that failed later on.
    created: Option<Tenant>,
}

/// What the wizard front end renders for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub step: OnboardingStep,
    pub step_number: u8,
    pub step_label: &'static str,
    pub can_advance: bool,
    pub slug_touched: bool,
    pub meta_title_touched: bool,
    pub form: OnboardingForm,
}

impl SessionView {
    fn new(session_id: &SessionId, wizard: &OnboardingWizard) -> Self {
        let step = wizard.step();
        Self {
            session_id: session_id.clone(),
            step,
            step_number: step.number(),
            step_label: step.label(),
            can_advance: wizard.can_advance(step),
            slug_touched: wizard.slug_touched(),
            meta_title_touched: wizard.meta_title_touched(),
            form: wizard.form().clone(),
        }
    }
}

/// Drives onboarding wizard sessions and provisions the resulting tenants.
pub struct OnboardingService<T> {
    repository: Arc<T>,
    sessions: Mutex<HashMap<SessionId, WizardSession>>,
}

impl<T> OnboardingService<T>
where
    T: TenantRepository + 'static,
{
    pub fn new(repository: Arc<T>) -> Self {
        Self {
            repository,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn start(&self, owner: &ActorId) -> SessionView {
        let session_id = next_session_id();
        let wizard = OnboardingWizard::new();
        let view = SessionView::new(&session_id, &wizard);
        self.sessions().insert(
            session_id.clone(),
            WizardSession {
                owner: owner.clone(),
                wizard,
                completing: false,
                created: None,
            },
        );
        info!(session_id = %session_id, owner = %owner, "onboarding session started");
        view
    }

    pub fn session(
        &self,
        session_id: &SessionId,
        actor: &ActorId,
    ) -> Result<SessionView, OnboardingError> {
        self.with_session(session_id, actor, |session| {
            Ok(SessionView::new(session_id, &session.wizard))
        })
    }

    /// Apply edits in order and return the updated view.
    pub fn edit(
        &self,
        session_id: &SessionId,
        actor: &ActorId,
        edits: Vec<FieldEdit>,
    ) -> Result<SessionView, OnboardingError> {
        self.with_session(session_id, actor, |session| {
            for edit in edits {
                session.wizard.apply(edit);
            }
            Ok(SessionView::new(session_id, &session.wizard))
        })
    }

    pub fn next(
        &self,
        session_id: &SessionId,
        actor: &ActorId,
    ) -> Result<SessionView, OnboardingError> {
        self.with_session(session_id, actor, |session| {
            session.wizard.next()?;
            Ok(SessionView::new(session_id, &session.wizard))
        })
    }

    pub fn back(
        &self,
        session_id: &SessionId,
        actor: &ActorId,
    ) -> Result<SessionView, OnboardingError> {
        self.with_session(session_id, actor, |session| {
            session.wizard.back();
            Ok(SessionView::new(session_id, &session.wizard))
        })
    }

    /// Provision the tenant collected by a session. The session is closed on success and left
    /// open on failure so the owner can retry; a retry reuses the tenant row already written.
    pub fn complete(
        &self,
        session_id: &SessionId,
        actor: &ActorId,
    ) -> Result<ProvisionedTenant, OnboardingError> {
        let (draft, mut created) = self.begin_completion(session_id, actor)?;
        let outcome = self
            .provision(draft, actor, &mut created)
            .map_err(|source| setup_failed(actor, source));

        let mut sessions = self.sessions();
        match &outcome {
            Ok(_) => {
                sessions.remove(session_id);
            }
            Err(_) => {
                if let Some(session) = sessions.get_mut(session_id) {
                    session.completing = false;
                    session.created = created;
                }
            }
        }
        outcome
    }

    pub(crate) fn begin_completion(
        &self,
        session_id: &SessionId,
        actor: &ActorId,
    ) -> Result<(TenantDraft, Option<Tenant>), OnboardingError> {
        self.with_session(session_id, actor, |session| {
            if session.completing {
                return Err(OnboardingError::InFlight(session_id.clone()));
            }
            let draft = session.wizard.finish()?;
            session.completing = true;
            Ok((draft, session.created.clone()))
        })
    }

    /// Create the tenant, write all twelve feature records and link the owner's profile.
    ///
    /// Steps are not rolled back: a failure after the tenant exists leaves it in place.
    pub fn complete_wizard(
        &self,
        draft: TenantDraft,
        owner: &ActorId,
    ) -> Result<ProvisionedTenant, OnboardingError> {
        self.provision(draft, owner, &mut None)
            .map_err(|source| setup_failed(owner, source))
    }

    /// `created` holds the tenant from an earlier partial attempt; it is filled in as soon as
    /// the tenant row exists so a later failure can hand it back to the session.
    fn provision(
        &self,
        draft: TenantDraft,
        owner: &ActorId,
        created: &mut Option<Tenant>,
    ) -> Result<ProvisionedTenant, RepositoryError> {
        let tenant = match created.clone() {
            Some(tenant) => {
                info!(tenant_id = %tenant.id, slug = %tenant.slug, "resuming tenant setup");
                tenant
            }
            None => {
                let slug = unique_slug(&draft.slug, |candidate| {
                    self.repository.slug_exists(candidate)
                })?;
                if slug != draft.slug {
                    info!(requested = %draft.slug, assigned = %slug, "tenant slug already taken");
                }

                let tenant = self.repository.create_tenant(Tenant {
                    id: next_tenant_id(),
                    name: draft.name,
                    slug,
                    contact: draft.contact,
                    locale: draft.locale,
                    branding: draft.branding,
                    seo: draft.seo,
                    activity_tracking: draft.activity_tracking,
                    owner: owner.clone(),
                    created_at: Utc::now(),
                })?;
                *created = Some(tenant.clone());
                tenant
            }
        };

        let features: Vec<FeatureFlag> = draft
            .features
            .into_iter()
            .map(|(feature, enabled)| FeatureFlag {
                tenant_id: tenant.id.clone(),
                feature,
                enabled,
            })
            .collect();
        self.repository.write_features(&tenant.id, &features)?;
        self.repository.link_profile(owner, &tenant.id)?;

        info!(
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            owner = %owner,
            enabled = features.iter().filter(|flag| flag.enabled).count(),
            "tenant provisioned"
        );

        Ok(ProvisionedTenant { tenant, features })
    }

    pub fn tenant_by_slug(&self, slug: &str) -> Result<ProvisionedTenant, OnboardingError> {
        let tenant = self
            .repository
            .fetch_by_slug(slug)?
            .ok_or_else(|| OnboardingError::TenantNotFound(slug.to_string()))?;
        let features = self.repository.features(&tenant.id)?;
        Ok(ProvisionedTenant { tenant, features })
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, WizardSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `apply` on a session owned by `actor`; other actors see `SessionNotFound`.
    fn with_session<V>(
        &self,
        session_id: &SessionId,
        actor: &ActorId,
        apply: impl FnOnce(&mut WizardSession) -> Result<V, OnboardingError>,
    ) -> Result<V, OnboardingError> {
        let mut sessions = self.sessions();
        match sessions.get_mut(session_id) {
            Some(session) if session.owner == *actor => apply(session),
            Some(_) => {
                warn!(session_id = %session_id, actor = %actor, "session accessed by another actor");
                Err(OnboardingError::SessionNotFound(session_id.clone()))
            }
            None => Err(OnboardingError::SessionNotFound(session_id.clone())),
        }
    }
}

fn setup_failed(owner: &ActorId, source: RepositoryError) -> OnboardingError {
    error!(owner = %owner, error = %source, "tenant setup failed");
    OnboardingError::SetupFailed(source)
}

#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error("onboarding session {0} not found")]
    SessionNotFound(SessionId),
    #[error("no school is registered under '{0}'")]
    TenantNotFound(String),
    #[error("onboarding session {0} is already being completed")]
    InFlight(SessionId),
    #[error("school setup failed, please try again")]
    SetupFailed(#[source] RepositoryError),
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}
