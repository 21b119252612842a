//! Admissions approval and tenant onboarding for the school platform.
//!
//! The workflows are storage agnostic: repositories and outbound collaborators are traits so the
//! HTTP service and the tests can inject their own implementations.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
