//! Caller identity established by auth strategies.

use serde::{Deserialize, Serialize};

/// The authenticated identity of the caller.
///
/// Auth strategies set this on the [`Context`](crate::Context); it starts out
/// as [`CallerIdentity::Anonymous`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallerIdentity {
    /// A user authenticated with a bearer token.
    User {
        /// Stable user identifier.
        user_id: String,
        /// Roles granted to the user.
        #[serde(default)]
        roles: Vec<String>,
    },
    /// A client authenticated with an API key.
    ApiKey {
        /// Identifier of the key (never the secret itself).
        key_id: String,
        /// Scopes granted to the key.
        #[serde(default)]
        scopes: Vec<String>,
    },
    /// No credential was presented or required.
    #[default]
    Anonymous,
}

impl CallerIdentity {
    /// Creates a user identity without roles.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User {
            user_id: user_id.into(),
            roles: Vec::new(),
        }
    }

    /// Creates an API key identity without scopes.
    pub fn api_key(key_id: impl Into<String>) -> Self {
        Self::ApiKey {
            key_id: key_id.into(),
            scopes: Vec::new(),
        }
    }

    /// Returns `true` unless the caller is anonymous.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// Returns a string identifier suitable for logging.
    ///
    /// Never includes secrets.
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::User { user_id, .. } => format!("user:{user_id}"),
            Self::ApiKey { key_id, .. } => format!("apikey:{key_id}"),
            Self::Anonymous => "anonymous".to_string(),
        }
    }

    /// Returns roles, treating API key scopes as pseudo-roles.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        match self {
            Self::User { roles, .. } => roles.iter().map(String::as_str).collect(),
            Self::ApiKey { scopes, .. } => scopes.iter().map(String::as_str).collect(),
            Self::Anonymous => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_ids() {
        assert_eq!(CallerIdentity::user("u1").log_id(), "user:u1");
        assert_eq!(CallerIdentity::api_key("k1").log_id(), "apikey:k1");
        assert_eq!(CallerIdentity::Anonymous.log_id(), "anonymous");
    }

    #[test]
    fn test_roles_from_scopes() {
        let identity = CallerIdentity::ApiKey {
            key_id: "k".to_string(),
            scopes: vec!["read".to_string(), "write".to_string()],
        };
        assert_eq!(identity.roles(), vec!["read", "write"]);
        assert!(identity.is_authenticated());
        assert!(!CallerIdentity::default().is_authenticated());
    }

    #[test]
    fn test_serialization_is_tagged() {
        let identity = CallerIdentity::user("u123");
        let json = serde_json::to_string(&identity).unwrap();
        assert!(json.contains("\"type\":\"user\""));
        assert!(json.contains("\"user_id\":\"u123\""));
    }
}
