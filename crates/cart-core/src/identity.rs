//! # Cart Identity
//!
//! Tagged identity for cart operations. Every cart operation resolves the
//! identity once up front; there is no guest-vs-logged-in shape sniffing
//! further down the call chain.

use serde::{Deserialize, Serialize};

/// The identity a cart is scoped to.
///
/// A cart belongs to exactly one of the two storage backends: the
/// device-local store (anonymous) or the server-persisted store
/// (authenticated). Switching sides requires an explicit merge, see
/// [`crate::cart::CartStore::merge_into_authenticated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CartIdentity {
    /// Anonymous device scope (local persistence, single-writer)
    Anonymous { device_token: String },
    /// Authenticated principal (server persistence)
    Authenticated { user_id: String },
}

impl CartIdentity {
    /// Anonymous identity for a device token
    pub fn anonymous(device_token: impl Into<String>) -> Self {
        CartIdentity::Anonymous {
            device_token: device_token.into(),
        }
    }

    /// Authenticated identity for a user
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        CartIdentity::Authenticated {
            user_id: user_id.into(),
        }
    }

    /// Whether this identity is authenticated
    pub fn is_authenticated(&self) -> bool {
        matches!(self, CartIdentity::Authenticated { .. })
    }

    /// Stable key identifying the storage scope (for logging)
    pub fn scope(&self) -> &str {
        match self {
            CartIdentity::Anonymous { device_token } => device_token,
            CartIdentity::Authenticated { user_id } => user_id,
        }
    }
}

impl std::fmt::Display for CartIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartIdentity::Anonymous { device_token } => write!(f, "anonymous:{}", device_token),
            CartIdentity::Authenticated { user_id } => write!(f, "user:{}", user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_kinds() {
        let anon = CartIdentity::anonymous("dev-1");
        let auth = CartIdentity::authenticated("user-1");

        assert!(!anon.is_authenticated());
        assert!(auth.is_authenticated());
        assert_eq!(anon.scope(), "dev-1");
        assert_eq!(auth.to_string(), "user:user-1");
    }
}
