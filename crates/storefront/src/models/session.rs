//! Session-related types.
//!
//! Types stored in the server-side session between requests.

use serde::{Deserialize, Serialize};

use mix_catalogo_core::{Email, UserId, UserRole};

use crate::api::{ApiToken, Cart, User};

/// Session-stored user identity.
///
/// The subset of the backend user the pages need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: UserRole,
    #[serde(default)]
    pub phone: Option<String>,
}

impl SessionUser {
    /// Whether the user may enter `/admin`.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Whether the user may manage vendors.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// First word of the name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            phone: user.phone,
        }
    }
}

/// Token and user, stored as one value so neither exists without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: ApiToken,
    pub user: SessionUser,
}

/// The last cart the backend returned, tagged with whose it is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub owner: UserId,
    pub cart: Option<Cart>,
}

impl CartSnapshot {
    /// Sum of quantities, zero when there is no cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::item_count)
    }
}

/// Session keys.
pub mod keys {
    /// Key for the [`AuthSession`](super::AuthSession).
    pub const AUTH: &str = "auth";

    /// Key for the [`CartSnapshot`](super::CartSnapshot).
    pub const CART: &str = "cart";

    /// Key for the pending flash [`Toast`](crate::models::Toast).
    pub const TOAST: &str = "toast";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_auth_session_round_trip_keeps_token() {
        let auth = AuthSession {
            token: ApiToken::new("tok-123"),
            user: SessionUser {
                id: UserId::new(7),
                email: Email::parse("ana@mix.com").unwrap(),
                name: "Ana Souza".to_string(),
                role: UserRole::Vendor,
                phone: None,
            },
        };
        let stored = serde_json::to_value(&auth).unwrap();
        let restored: AuthSession = serde_json::from_value(stored).unwrap();
        assert_eq!(restored, auth);
        assert_eq!(restored.token.expose(), "tok-123");
    }

    #[test]
    fn test_partial_auth_session_does_not_decode() {
        let user_only = json!({
            "user": {"id": 7, "email": "ana@mix.com", "name": "Ana", "role": "vendedor"}
        });
        assert!(serde_json::from_value::<AuthSession>(user_only).is_err());

        let token_only = json!({"token": "tok-123"});
        assert!(serde_json::from_value::<AuthSession>(token_only).is_err());
    }

    #[test]
    fn test_first_name() {
        let user = SessionUser {
            id: UserId::new(1),
            email: Email::parse("ana@mix.com").unwrap(),
            name: "Ana Souza".to_string(),
            role: UserRole::Customer,
            phone: None,
        };
        assert_eq!(user.first_name(), "Ana");
        assert!(!user.is_staff());
        assert!(!user.is_admin());
    }
}
