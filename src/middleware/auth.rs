use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::{
    error::AppError,
    identity::{IdentityError, Introspection},
    state::AppState,
};

/// The authenticated caller, resolved from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Identity provider subject.
    pub user_id: String,
    pub username: Option<String>,
    pub roles: Vec<String>,
}

impl AuthUser {
    /// `None` when the token is inactive or carries no subject.
    pub fn from_introspection(result: Introspection) -> Option<Self> {
        if !result.active {
            return None;
        }
        let roles = result.resource_roles();
        let user_id = result.sub.filter(|sub| !sub.is_empty())?;
        Some(Self {
            user_id,
            username: result.preferred_username,
            roles,
        })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if !user.has_role(role) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, "admin")
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthenticated("Missing or invalid authorization".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthenticated("Missing or invalid authorization".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Missing or invalid authorization".into()))?;
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let state = AppState::from_ref(state);

        let result = match state.identity.introspect(token).await {
            Ok(result) => result,
            Err(IdentityError::Decode(err)) => {
                tracing::warn!(error = %err, path = %parts.uri.path(), "unparseable introspection result");
                return Err(AppError::Unauthenticated(
                    "Token is invalid or revoked".into(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        AuthUser::from_introspection(result).ok_or_else(|| {
            tracing::info!(path = %parts.uri.path(), "token is invalid or revoked");
            AppError::Unauthenticated("Token is invalid or revoked".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::http::Request;

    use super::*;
    use crate::identity::RoleSet;

    fn introspection(active: bool, sub: Option<&str>) -> Introspection {
        let mut resource_access = HashMap::new();
        resource_access.insert(
            "shophub-api".to_string(),
            RoleSet {
                roles: vec!["admin".into()],
            },
        );
        Introspection {
            active,
            sub: sub.map(str::to_string),
            preferred_username: Some("alice".into()),
            resource_access,
            ..Introspection::default()
        }
    }

    #[test]
    fn active_token_with_subject_becomes_principal() {
        let user = AuthUser::from_introspection(introspection(true, Some("user-1"))).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert!(user.has_role("admin"));
        assert!(ensure_admin(&user).is_ok());
    }

    #[test]
    fn inactive_or_anonymous_tokens_are_rejected() {
        assert!(AuthUser::from_introspection(introspection(false, Some("user-1"))).is_none());
        assert!(AuthUser::from_introspection(introspection(true, None)).is_none());
        assert!(AuthUser::from_introspection(introspection(true, Some(""))).is_none());
    }

    #[test]
    fn missing_role_is_forbidden() {
        let user = AuthUser {
            user_id: "user-1".into(),
            username: None,
            roles: vec!["customer".into()],
        };
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    }

    #[test]
    fn extracts_bearer_token() {
        let (parts, _) = Request::builder()
            .header("Authorization", "Bearer abc.def")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def");

        let (parts, _) = Request::builder()
            .header("Authorization", "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        assert!(matches!(
            bearer_token(&parts),
            Err(AppError::Unauthenticated(_))
        ));
    }
}
