//! Connect, test, refresh and disconnect lifecycle for external notification providers.

pub mod domain;
pub mod provider;
pub mod registry;
pub mod router;

pub use domain::{Channel, ChannelStatus, CredentialKind, Credentials};
pub use provider::{CredentialShapeClient, ProviderClient, ProviderError};
pub use registry::{IntegrationError, IntegrationRegistry};
pub use router::integrations_router;
