use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Header carrying the caller identity supplied by the upstream auth provider.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Opaque identity of whoever triggered an operation (reviewer, tenant owner).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the actor from request headers; blank or non-UTF-8 values count as missing.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
