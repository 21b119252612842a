use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// External providers the platform can notify or sync through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Chat,
    Calendar,
    Storage,
    Video,
}

impl Channel {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Email,
            Self::Sms,
            Self::Chat,
            Self::Calendar,
            Self::Storage,
            Self::Video,
        ]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Chat => "chat",
            Self::Calendar => "calendar",
            Self::Storage => "storage",
            Self::Video => "video",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ordered()
            .into_iter()
            .find(|channel| channel.key().eq_ignore_ascii_case(value))
    }

    pub const fn credential_kind(self) -> CredentialKind {
        match self {
            Self::Email => CredentialKind::ApiKey,
            Self::Sms => CredentialKind::KeyAndSecret,
            Self::Chat | Self::Calendar | Self::Storage | Self::Video => {
                CredentialKind::AccessToken
            }
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    ApiKey,
    KeyAndSecret,
    AccessToken,
}

/// Credential set as entered by an administrator; which fields matter depends on the channel.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Credentials {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn key_and_secret(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            api_secret: Some(secret.into()),
            access_token: None,
        }
    }

    pub fn access_token(token: impl Into<String>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Check that the fields required by `kind` are present and non-blank.
    pub fn check_shape(&self, kind: CredentialKind) -> Result<(), &'static str> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        };
        match kind {
            CredentialKind::ApiKey if !present(&self.api_key) => Err("an API key is required"),
            CredentialKind::KeyAndSecret if !present(&self.api_key) || !present(&self.api_secret) => {
                Err("an API key and secret are required")
            }
            CredentialKind::AccessToken if !present(&self.access_token) => {
                Err("an access token is required")
            }
            _ => Ok(()),
        }
    }
}

// Secrets never reach log output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "***");
        f.debug_struct("Credentials")
            .field("api_key", &mask(&self.api_key))
            .field("api_secret", &mask(&self.api_secret))
            .field("access_token", &mask(&self.access_token))
            .finish()
    }
}

/// Connection state of one channel as reported to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub channel: Channel,
    pub credential_kind: CredentialKind,
    pub connected: bool,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ChannelStatus {
    pub fn disconnected(channel: Channel) -> Self {
        Self {
            channel,
            credential_kind: channel.credential_kind(),
            connected: false,
            connected_at: None,
            last_tested_at: None,
            last_refreshed_at: None,
            last_error: None,
        }
    }
}
