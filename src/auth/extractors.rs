use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo_types::User;

/// Gate for protected routes: a valid bearer token whose user still exists.
pub struct AuthUser(pub User);

/// Same resolution as `AuthUser` but never rejects: any failure, including a
/// store error, reads as anonymous.
pub struct MaybeAuthUser(pub Option<User>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;
    let (scheme, token) = auth.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<User, ApiError> {
    let token = bearer_token(parts).ok_or_else(|| {
        warn!("missing or malformed Authorization header");
        ApiError::Unauthorized
    })?;

    let claims = state.keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid token");
        ApiError::Unauthorized
    })?;

    state.users.find_by_id(claims.sub).await?.ok_or_else(|| {
        warn!(user_id = %claims.sub, "token for unknown user");
        ApiError::Unauthorized
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map(AuthUser)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(user) => Ok(MaybeAuthUser(Some(user))),
            Err(ApiError::Unauthorized) => Ok(MaybeAuthUser(None)),
            Err(e) => {
                warn!(error = ?e, "could not resolve optional viewer");
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
