use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::domain::{FeatureFlag, FeatureKey, Tenant, TenantId};
use super::repository::{RepositoryError, TenantRepository};
use crate::workflows::identity::ActorId;

#[derive(Debug, Default)]
struct TenantState {
    tenants: HashMap<TenantId, Tenant>,
    features: HashMap<TenantId, BTreeMap<FeatureKey, bool>>,
    profiles: HashMap<ActorId, TenantId>,
}

/// Process-local tenant store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTenantRepository {
    state: Arc<Mutex<TenantState>>,
}

impl InMemoryTenantRepository {
    fn state(&self) -> MutexGuard<'_, TenantState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TenantRepository for InMemoryTenantRepository {
    fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        Ok(self.state().tenants.values().any(|tenant| tenant.slug == slug))
    }

    fn create_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError> {
        let mut state = self.state();
        if state.tenants.contains_key(&tenant.id)
            || state.tenants.values().any(|existing| existing.slug == tenant.slug)
        {
            return Err(RepositoryError::Conflict);
        }
        state.tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }

    fn write_features(
        &self,
        tenant_id: &TenantId,
        flags: &[FeatureFlag],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if !state.tenants.contains_key(tenant_id) {
            return Err(RepositoryError::NotFound);
        }
        let records = flags
            .iter()
            .map(|flag| (flag.feature, flag.enabled))
            .collect();
        state.features.insert(tenant_id.clone(), records);
        Ok(())
    }

    fn link_profile(&self, owner: &ActorId, tenant_id: &TenantId) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if !state.tenants.contains_key(tenant_id) {
            return Err(RepositoryError::NotFound);
        }
        state.profiles.insert(owner.clone(), tenant_id.clone());
        Ok(())
    }

    fn fetch_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self
            .state()
            .tenants
            .values()
            .find(|tenant| tenant.slug == slug)
            .cloned())
    }

    fn features(&self, tenant_id: &TenantId) -> Result<Vec<FeatureFlag>, RepositoryError> {
        Ok(self
            .state()
            .features
            .get(tenant_id)
            .map(|records| {
                records
                    .iter()
                    .map(|(feature, enabled)| FeatureFlag {
                        tenant_id: tenant_id.clone(),
                        feature: *feature,
                        enabled: *enabled,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn profile_tenant(&self, owner: &ActorId) -> Result<Option<TenantId>, RepositoryError> {
        Ok(self.state().profiles.get(owner).cloned())
    }
}
