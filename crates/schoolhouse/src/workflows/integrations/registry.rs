use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{Channel, ChannelStatus, Credentials};
use super::provider::{ProviderClient, ProviderError};
use crate::config::IntegrationsConfig;

#[derive(Debug)]
struct ChannelEntry {
    credentials: Option<Credentials>,
    status: ChannelStatus,
}

/// Tracks which notification and sync providers are connected.
pub struct IntegrationRegistry<P> {
    provider: Arc<P>,
    channels: Mutex<HashMap<Channel, ChannelEntry>>,
}

impl<P> IntegrationRegistry<P>
where
    P: ProviderClient + 'static,
{
    pub fn new(provider: Arc<P>) -> Self {
        let channels = Channel::ordered()
            .into_iter()
            .map(|channel| {
                (
                    channel,
                    ChannelEntry {
                        credentials: None,
                        status: ChannelStatus::disconnected(channel),
                    },
                )
            })
            .collect();
        Self {
            provider,
            channels: Mutex::new(channels),
        }
    }

    /// Connect every channel that has credentials in configuration. Failures leave the channel
    /// disconnected and are logged.
    pub fn from_config(provider: Arc<P>, config: &IntegrationsConfig) -> Self {
        let registry = Self::new(provider);
        for (channel, credentials) in configured_credentials(config) {
            if let Err(err) = registry.connect(channel, credentials) {
                warn!(%channel, error = %err, "configured integration could not connect");
            }
        }
        registry
    }

    pub fn connect(
        &self,
        channel: Channel,
        credentials: Credentials,
    ) -> Result<ChannelStatus, IntegrationError> {
        credentials
            .check_shape(channel.credential_kind())
            .map_err(|message| IntegrationError::InvalidCredentials { channel, message })?;
        self.provider
            .verify(channel, &credentials)
            .map_err(|source| IntegrationError::Provider { channel, source })?;

        let mut channels = self.channels();
        let entry = entry(&mut channels, channel);
        let now = Utc::now();
        entry.credentials = Some(credentials);
        entry.status = ChannelStatus {
            connected: true,
            connected_at: Some(now),
            ..ChannelStatus::disconnected(channel)
        };
        info!(%channel, "integration connected");
        Ok(entry.status.clone())
    }

    /// Exercise a connected channel; the outcome is recorded on the status.
    pub fn test(&self, channel: Channel) -> Result<ChannelStatus, IntegrationError> {
        let credentials = self.stored_credentials(channel)?;
        let outcome = self.provider.test(channel, &credentials);

        let mut channels = self.channels();
        let entry = entry(&mut channels, channel);
        entry.status.last_tested_at = Some(Utc::now());
        match outcome {
            Ok(()) => {
                entry.status.last_error = None;
                Ok(entry.status.clone())
            }
            Err(source) => {
                warn!(%channel, error = %source, "integration test failed");
                entry.status.last_error = Some(source.to_string());
                Err(IntegrationError::Provider { channel, source })
            }
        }
    }

    pub fn refresh(&self, channel: Channel) -> Result<ChannelStatus, IntegrationError> {
        let credentials = self.stored_credentials(channel)?;
        let refreshed = self
            .provider
            .refresh(channel, &credentials)
            .map_err(|source| IntegrationError::Provider { channel, source })?;

        let mut channels = self.channels();
        let entry = entry(&mut channels, channel);
        entry.credentials = Some(refreshed);
        entry.status.last_refreshed_at = Some(Utc::now());
        entry.status.last_error = None;
        info!(%channel, "integration credentials refreshed");
        Ok(entry.status.clone())
    }

    /// Drop stored credentials. Disconnecting an idle channel is a no-op.
    pub fn disconnect(&self, channel: Channel) -> ChannelStatus {
        let mut channels = self.channels();
        let entry = entry(&mut channels, channel);
        if entry.credentials.take().is_some() {
            info!(%channel, "integration disconnected");
        }
        entry.status = ChannelStatus::disconnected(channel);
        entry.status.clone()
    }

    pub fn is_connected(&self, channel: Channel) -> bool {
        self.channels()
            .get(&channel)
            .map(|entry| entry.status.connected)
            .unwrap_or(false)
    }

    /// Status of every channel in display order.
    pub fn statuses(&self) -> Vec<ChannelStatus> {
        let channels = self.channels();
        Channel::ordered()
            .into_iter()
            .map(|channel| {
                channels
                    .get(&channel)
                    .map(|entry| entry.status.clone())
                    .unwrap_or_else(|| ChannelStatus::disconnected(channel))
            })
            .collect()
    }

    fn stored_credentials(&self, channel: Channel) -> Result<Credentials, IntegrationError> {
        self.channels()
            .get(&channel)
            .and_then(|entry| entry.credentials.clone())
            .ok_or(IntegrationError::NotConnected(channel))
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<Channel, ChannelEntry>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn entry(channels: &mut HashMap<Channel, ChannelEntry>, channel: Channel) -> &mut ChannelEntry {
    channels.entry(channel).or_insert_with(|| ChannelEntry {
        credentials: None,
        status: ChannelStatus::disconnected(channel),
    })
}

fn configured_credentials(config: &IntegrationsConfig) -> Vec<(Channel, Credentials)> {
    let mut configured = Vec::new();
    if let Some(key) = &config.email_api_key {
        configured.push((Channel::Email, Credentials::api_key(key.clone())));
    }
    if config.sms_api_key.is_some() || config.sms_api_secret.is_some() {
        configured.push((
            Channel::Sms,
            Credentials {
                api_key: config.sms_api_key.clone(),
                api_secret: config.sms_api_secret.clone(),
                access_token: None,
            },
        ));
    }
    let tokens = [
        (Channel::Chat, &config.chat_token),
        (Channel::Calendar, &config.calendar_token),
        (Channel::Storage, &config.storage_token),
        (Channel::Video, &config.video_token),
    ];
    for (channel, token) in tokens {
        if let Some(token) = token {
            configured.push((channel, Credentials::access_token(token.clone())));
        }
    }
    configured
}

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("invalid {channel} credentials: {message}")]
    InvalidCredentials {
        channel: Channel,
        message: &'static str,
    },
    #[error("{0} is not connected")]
    NotConnected(Channel),
    #[error("{channel} provider error: {source}")]
    Provider {
        channel: Channel,
        #[source]
        source: ProviderError,
    },
    #[error("'{0}' is not a known integration channel")]
    UnknownChannel(String),
}
