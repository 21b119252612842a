use super::domain::{FeatureFlag, Tenant, TenantId};
use crate::workflows::identity::ActorId;
pub use crate::workflows::persistence::RepositoryError;

/// Storage abstraction for tenants, their feature records and owner profile links.
pub trait TenantRepository: Send + Sync {
    fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError>;
    /// Store a new tenant. `Conflict` when the slug is already taken.
    fn create_tenant(&self, tenant: Tenant) -> Result<Tenant, RepositoryError>;
    /// Replace the feature records of a tenant. `NotFound` for unknown tenants.
    fn write_features(
        &self,
        tenant_id: &TenantId,
        flags: &[FeatureFlag],
    ) -> Result<(), RepositoryError>;
    /// Point the owner's profile at the tenant.
    fn link_profile(&self, owner: &ActorId, tenant_id: &TenantId) -> Result<(), RepositoryError>;
    fn fetch_by_slug(&self, slug: &str) -> Result<Option<Tenant>, RepositoryError>;
    /// Feature records in feature key order.
    fn features(&self, tenant_id: &TenantId) -> Result<Vec<FeatureFlag>, RepositoryError>;
    fn profile_tenant(&self, owner: &ActorId) -> Result<Option<TenantId>, RepositoryError>;
}
