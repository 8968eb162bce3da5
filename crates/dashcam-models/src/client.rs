//! Client identity.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum accepted length of a client identifier.
pub const MAX_CLIENT_ID_LEN: usize = 64;

/// Errors produced when validating a client identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientIdError {
    #[error("client id must not be empty")]
    Empty,

    #[error("client id exceeds {MAX_CLIENT_ID_LEN} characters")]
    TooLong,

    #[error("client id contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Identity of a streaming client.
///
/// The identifier is embedded in the output file name, so only ASCII
/// alphanumerics, hyphens and underscores are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);

impl ClientId {
    /// Validate and wrap a client identifier.
    pub fn parse(id: impl Into<String>) -> Result<Self, ClientIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ClientIdError::Empty);
        }
        if id.len() > MAX_CLIENT_ID_LEN {
            return Err(ClientIdError::TooLong);
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(ClientIdError::InvalidCharacter(c));
        }
        Ok(Self(id))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ClientId {
    type Error = ClientIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.0
    }
}
