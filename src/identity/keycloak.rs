use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use super::{IdentityError, Introspection, TokenIntrospector};

/// Client for the OpenID Connect token introspection endpoint of a realm.
#[derive(Clone)]
pub struct KeycloakIntrospector {
    client: Client,
    endpoint: String,
    client_id: String,
    client_secret: SecretString,
}

impl std::fmt::Debug for KeycloakIntrospector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakIntrospector")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl KeycloakIntrospector {
    pub fn new(
        base_url: &str,
        realm: &str,
        client_id: &str,
        client_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        let endpoint = format!(
            "{}/realms/{realm}/protocol/openid-connect/token/introspect",
            base_url.trim_end_matches('/')
        );
        Ok(Self {
            client,
            endpoint,
            client_id: client_id.to_string(),
            client_secret,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenIntrospector for KeycloakIntrospector {
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn introspect(&self, token: &str) -> Result<Introspection, IdentityError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[
                ("token", token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        let result: Introspection =
            serde_json::from_slice(&bytes).map_err(|e| IdentityError::Decode(e.to_string()))?;

        debug!(active = result.active, sub = ?result.sub, "token introspected");
        Ok(result)
    }
}
