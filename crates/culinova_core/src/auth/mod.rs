//! Sign-in helpers shared by host identity integrations.
//!
//! The host owns the provider SDKs; the core only needs the identity it
//! settled on and the nonce material used to bind provider tokens.

mod nonce;

pub use nonce::{random_nonce, sha256_hex, DEFAULT_NONCE_LEN, NONCE_CHARSET};

use crate::model::user::AuthProvider;
use serde::{Deserialize, Serialize};

/// Identity reported by the host after a provider signs a user in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthIdentity {
    /// Provider-issued stable subject (e.g. a Firebase uid).
    pub external_id: String,
    pub display_name: Option<String>,
    pub provider: AuthProvider,
}

impl AuthIdentity {
    pub fn new(external_id: impl Into<String>, provider: AuthProvider) -> Self {
        Self {
            external_id: external_id.into(),
            display_name: None,
            provider,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}
