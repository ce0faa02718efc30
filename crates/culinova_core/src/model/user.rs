//! User, credential and follow records.
//!
//! # Responsibility
//! - Define the locally cached account record and its auth credentials.
//! - Define the social follow edge between two users.
//!
//! # Invariants
//! - `username` is stored lowercase and is unique per store.
//! - `external_id` is the identity provider subject; unique when present.
//!   `None` marks a legacy record created before sign-in existed.

use crate::db::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UserId = Uuid;
pub type CredentialId = Uuid;
pub type FollowId = Uuid;

/// Identity provider that authenticated a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProvider {
    Password,
    Passkey,
    Apple,
    Google,
}

impl AuthProvider {
    /// Storage/wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Passkey => "passkey",
            Self::Apple => "apple",
            Self::Google => "google",
        }
    }

    /// Parses a storage/wire label. Case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "password" => Some(Self::Password),
            "passkey" => Some(Self::Passkey),
            "apple" => Some(Self::Apple),
            "google" => Some(Self::Google),
            _ => None,
        }
    }
}

/// Locally cached account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Lowercased, unique handle.
    pub username: String,
    /// Identity provider subject (`uid`). `None` for legacy records.
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
}

impl User {
    /// Creates a user with a generated id and a lowercased username.
    pub fn new(username: impl AsRef<str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.as_ref().trim().to_lowercase(),
            external_id: None,
            display_name: None,
            avatar_url: None,
            created_at: now_epoch_ms(),
        }
    }

    /// Creates the local record for a freshly signed-in identity.
    ///
    /// Username is the lowercased provider subject.
    pub fn for_external_identity(external_id: &str, display_name: Option<String>) -> Self {
        let mut user = Self::new(external_id);
        user.external_id = Some(external_id.to_string());
        user.display_name = display_name;
        user
    }

    /// Returns whether this record predates identity-provider sign-in.
    pub fn is_legacy(&self) -> bool {
        self.external_id.is_none()
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.username.trim().is_empty() {
            return Err(UserValidationError::BlankUsername);
        }
        if self.username != self.username.to_lowercase() {
            return Err(UserValidationError::UsernameNotLowercase(
                self.username.clone(),
            ));
        }
        if let Some(external_id) = self.external_id.as_deref() {
            if external_id.trim().is_empty() {
                return Err(UserValidationError::BlankExternalId);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    BlankUsername,
    UsernameNotLowercase(String),
    BlankExternalId,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUsername => write!(f, "username must not be blank"),
            Self::UsernameNotLowercase(value) => {
                write!(f, "username must be lowercase: `{value}`")
            }
            Self::BlankExternalId => write!(f, "external id must not be blank when set"),
        }
    }
}

impl Error for UserValidationError {}

/// Record of which identity provider authenticated a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredential {
    pub id: CredentialId,
    pub user_id: UserId,
    pub provider: AuthProvider,
    /// Provider subject for Apple/Google/password sign-in.
    pub external_id: Option<String>,
    /// Raw passkey credential id.
    pub credential_id: Option<Vec<u8>>,
    pub created_at: i64,
}

impl AuthCredential {
    pub fn new(user_id: UserId, provider: AuthProvider) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            provider,
            external_id: None,
            credential_id: None,
            created_at: now_epoch_ms(),
        }
    }
}

/// Directed social edge: `follower_id` follows `followee_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub id: FollowId,
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{AuthProvider, User, UserValidationError};

    #[test]
    fn new_user_lowercases_username() {
        let user = User::new("  ChefAnna ");
        assert_eq!(user.username, "chefanna");
        assert!(user.is_legacy());
        assert!(user.validate().is_ok());
    }

    #[test]
    fn external_identity_uses_lowercased_subject_as_username() {
        let user = User::for_external_identity("AbC123", Some("Anna".to_string()));
        assert_eq!(user.username, "abc123");
        assert_eq!(user.external_id.as_deref(), Some("AbC123"));
        assert!(!user.is_legacy());
    }

    #[test]
    fn validate_rejects_blank_username() {
        let user = User::new("   ");
        assert_eq!(user.validate(), Err(UserValidationError::BlankUsername));
    }

    #[test]
    fn provider_labels_round_trip() {
        for provider in [
            AuthProvider::Password,
            AuthProvider::Passkey,
            AuthProvider::Apple,
            AuthProvider::Google,
        ] {
            assert_eq!(AuthProvider::parse(provider.as_str()), Some(provider));
        }
        assert_eq!(AuthProvider::parse(" APPLE "), Some(AuthProvider::Apple));
        assert_eq!(AuthProvider::parse("github"), None);
    }
}
