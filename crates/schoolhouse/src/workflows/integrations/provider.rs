use super::domain::{Channel, Credentials};

/// Provider-side operations behind the connect/test/refresh lifecycle.
pub trait ProviderClient: Send + Sync {
    /// Confirm the provider accepts the credentials before they are stored.
    fn verify(&self, channel: Channel, credentials: &Credentials) -> Result<(), ProviderError>;
    /// Exercise a stored connection.
    fn test(&self, channel: Channel, credentials: &Credentials) -> Result<(), ProviderError>;
    /// Exchange stored credentials for fresh ones.
    fn refresh(
        &self,
        channel: Channel,
        credentials: &Credentials,
    ) -> Result<Credentials, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider rejected the credentials: {0}")]
    Rejected(String),
}

/// Offline client that only checks each channel's credential shape.
#[derive(Debug, Clone, Default)]
pub struct CredentialShapeClient;

impl ProviderClient for CredentialShapeClient {
    fn verify(&self, channel: Channel, credentials: &Credentials) -> Result<(), ProviderError> {
        credentials
            .check_shape(channel.credential_kind())
            .map_err(|message| ProviderError::Rejected(message.to_string()))
    }

    fn test(&self, channel: Channel, credentials: &Credentials) -> Result<(), ProviderError> {
        self.verify(channel, credentials)
    }

    fn refresh(
        &self,
        channel: Channel,
        credentials: &Credentials,
    ) -> Result<Credentials, ProviderError> {
        self.verify(channel, credentials)?;
        Ok(credentials.clone())
    }
}
