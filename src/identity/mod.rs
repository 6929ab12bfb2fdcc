//! Bearer token validation.
//!
//! Handlers never talk to the identity provider directly; the `AuthUser`
//! extractor asks the [`TokenIntrospector`] held in the application state.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::IdentityConfig;

mod jwt;
mod keycloak;

pub use jwt::{LocalClaims, SharedSecretIntrospector, LOCAL_RESOURCE};
pub use keycloak::KeycloakIntrospector;

/// Errors raised while asking the identity provider about a token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider could not be reached.
    #[error("introspection request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("introspection failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered with something that is not an introspection result.
    #[error("introspection response could not be parsed: {0}")]
    Decode(String),

    #[error("token could not be issued: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Result of an RFC 7662 token introspection, reduced to what the API uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Introspection {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub resource_access: HashMap<String, RoleSet>,
}

impl Introspection {
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Every role granted on any resource, sorted and deduplicated.
    pub fn resource_roles(&self) -> Vec<String> {
        self.resource_access
            .values()
            .flat_map(|set| set.roles.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    async fn introspect(&self, token: &str) -> Result<Introspection, IdentityError>;
}

/// Build the introspector selected by the configuration.
pub fn from_config(
    config: &IdentityConfig,
    timeout: Duration,
) -> Result<Arc<dyn TokenIntrospector>, IdentityError> {
    let introspector: Arc<dyn TokenIntrospector> = match config {
        IdentityConfig::Introspection {
            base_url,
            realm,
            client_id,
            client_secret,
        } => Arc::new(KeycloakIntrospector::new(
            base_url,
            realm,
            client_id,
            client_secret.clone(),
            timeout,
        )?),
        IdentityConfig::SharedSecret { secret } => {
            Arc::new(SharedSecretIntrospector::new(secret))
        }
    };
    Ok(introspector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keycloak_payload_and_collects_roles() {
        let payload = serde_json::json!({
            "active": true,
            "sub": "3f1c0d9e-user",
            "preferred_username": "alice",
            "typ": "Bearer",
            "resource_access": {
                "shophub-api": { "roles": ["customer", "admin"] },
                "account": { "roles": ["manage-account", "customer"] }
            }
        });

        let result: Introspection = serde_json::from_value(payload).unwrap();
        assert!(result.active);
        assert_eq!(result.sub.as_deref(), Some("3f1c0d9e-user"));
        assert_eq!(
            result.resource_roles(),
            vec!["admin", "customer", "manage-account"]
        );
    }

    #[test]
    fn inactive_payload_has_no_subject() {
        let result: Introspection =
            serde_json::from_value(serde_json::json!({ "active": false })).unwrap();
        assert_eq!(result, Introspection::inactive());
    }
}
