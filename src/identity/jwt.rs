use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{IdentityError, Introspection, RoleSet, TokenIntrospector};

/// Resource name under which locally issued roles are reported.
pub const LOCAL_RESOURCE: &str = "shophub-api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl LocalClaims {
    pub fn new(sub: impl Into<String>, roles: Vec<String>, ttl: Duration) -> Self {
        let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
        Self {
            sub: sub.into(),
            exp,
            preferred_username: None,
            roles,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.preferred_username = Some(username.into());
        self
    }

    /// Sign the claims with HS256.
    pub fn encode(&self, secret: &SecretString) -> Result<String, IdentityError> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .map_err(|e| IdentityError::Encode(e.to_string()))
    }
}

/// Validates HS256 tokens signed with a shared secret, for deployments without
/// an identity provider.
pub struct SharedSecretIntrospector {
    key: DecodingKey,
    validation: Validation,
}

impl SharedSecretIntrospector {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::default(),
        }
    }
}

#[async_trait]
impl TokenIntrospector for SharedSecretIntrospector {
    async fn introspect(&self, token: &str) -> Result<Introspection, IdentityError> {
        let claims = match decode::<LocalClaims>(token, &self.key, &self.validation) {
            Ok(data) => data.claims,
            Err(err) => {
                tracing::debug!(error = %err, "rejected locally signed token");
                return Ok(Introspection::inactive());
            }
        };

        let mut resource_access = HashMap::new();
        resource_access.insert(
            LOCAL_RESOURCE.to_string(),
            RoleSet {
                roles: claims.roles,
            },
        );

        Ok(Introspection {
            active: true,
            sub: Some(claims.sub),
            preferred_username: claims.preferred_username,
            email: None,
            exp: Some(claims.exp as i64),
            resource_access,
        })
    }
}
