use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::identity::ActorId;
use crate::workflows::onboarding::domain::{FeatureFlag, FeatureKey, Tenant, TenantId};
use crate::workflows::onboarding::repository::{RepositoryError, TenantRepository};
use crate::workflows::onboarding::service::{OnboardingService, SessionId};
use crate::workflows::onboarding::wizard::FieldEdit;
use crate::workflows::onboarding::InMemoryTenantRepository;

pub(super) fn owner() -> ActorId {
    ActorId::new("owner-1")
}

pub(super) type TestService = OnboardingService<InMemoryTenantRepository>;

pub(super) fn build_service() -> (TestService, Arc<InMemoryTenantRepository>) {
    let repository = Arc::new(InMemoryTenantRepository::default());
    let service = OnboardingService::new(repository.clone());
    (service, repository)
}

pub(super) fn school_info(name: &str) -> Vec<FieldEdit> {
    vec![
        FieldEdit::Name(name.to_string()),
        FieldEdit::ContactEmail("office@school.edu".to_string()),
    ]
}

pub(super) fn location() -> Vec<FieldEdit> {
    vec![
        FieldEdit::Timezone("Europe/Lisbon".to_string()),
        FieldEdit::Country("Portugal".to_string()),
    ]
}

/// Walk a fresh session to the last step with the given modules enabled.
pub(super) fn walk_to_activity<T: TenantRepository + 'static>(
    service: &OnboardingService<T>,
    actor: &ActorId,
    name: &str,
    features: &[FeatureKey],
) -> SessionId {
    let session = service.start(actor).session_id;
    service
        .edit(&session, actor, school_info(name))
        .expect("school info edits");
    service.next(&session, actor).expect("school info complete");
    service
        .edit(&session, actor, location())
        .expect("location edits");
    service.next(&session, actor).expect("location complete");
    service.next(&session, actor).expect("branding defaults");
    service.next(&session, actor).expect("seo optional");
    let modules = features
        .iter()
        .map(|key| FieldEdit::Feature {
            key: *key,
            enabled: true,
        })
        .collect();
    service
        .edit(&session, actor, modules)
        .expect("module edits");
    service.next(&session, actor).expect("modules selected");
    session
}

/// Store that accepts the tenant but fails feature writes, for good or for the first
/// `recover_after` attempts.
#[derive(Default)]
pub(super) struct FlakyFeatureStore {
    pub(super) inner: InMemoryTenantRepository,
    recover_after: Option<usize>,
    feature_writes: AtomicUsize,
}

impl FlakyFeatureStore {
    pub(super) fn failing_once() -> Self {
        Self {
            recover_after: Some(1),
            ..Self::default()
        }
    }
}

impl TenantRepository for FlakyFeatureStore {
    fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        self.inner.slug_exists(slug)
    }

    fn create_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        self.inner.create_tenant(tenant)
    }

    fn write_features(
        &self,
        tenant_id: &TenantId,
        flags: &[FeatureFlag],
    ) -> Result<(), RepositoryError> {
        let attempt = self.feature_writes.fetch_add(1, Ordering::SeqCst);
        match self.recover_after {
            Some(limit) if attempt >= limit => self.inner.write_features(tenant_id, flags),
            _ => Err(RepositoryError::Unavailable("feature table locked".to_string())),
        }
    }

    fn link_profile(&self, owner: &ActorId, tenant_id: &TenantId) -> Result<(), RepositoryError> {
        self.inner.link_profile(owner, tenant_id)
    }

    fn fetch_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError> {
        self.inner.fetch_by_slug(slug)
    }

    fn features(&self, tenant_id: &TenantId) -> Result<Vec<FeatureFlag>, RepositoryError> {
        self.inner.features(tenant_id)
    }

    fn profile_tenant(&self, owner: &ActorId) -> Result<Option<TenantId>, RepositoryError> {
        self.inner.profile_tenant(owner)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
