pub mod admissions;
pub mod identity;
pub mod integrations;
pub mod onboarding;
pub mod persistence;
