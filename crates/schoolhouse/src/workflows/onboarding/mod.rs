//! Six-step school onboarding wizard and tenant provisioning.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod slug;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    Branding, ContactInfo, FeatureFlag, FeatureKey, LocaleSettings, ProvisionedTenant,
    SeoMetadata, Tenant, TenantDraft, TenantId, ThemeChoice,
};
pub use memory::InMemoryTenantRepository;
pub use repository::TenantRepository;
pub use router::onboarding_router;
pub use service::{OnboardingError, OnboardingService, SessionId, SessionView};
pub use slug::{slugify, unique_slug};
pub use wizard::{FieldEdit, OnboardingForm, OnboardingStep, OnboardingWizard, WizardError};
