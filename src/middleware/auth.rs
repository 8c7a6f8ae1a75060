use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{api::AppState, error::AppError, models::UserInfo};

/// Optional viewer identity: `None` for guests, verified info otherwise.
///
/// A present-but-bad token is rejected rather than downgraded, so a client
/// never silently loses its signed-in privileges.
pub struct MaybeUser(pub Option<UserInfo>);

/// Verified viewer identity, required; rejects with 401 when absent
pub struct RequireUser(pub UserInfo);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("malformed authorization header".to_string()))?;

        let user = state.identity.verify(token).await?;
        Ok(Self(Some(user)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(Self(user)),
            MaybeUser(None) => Err(AppError::Unauthorized(
                "sign in to use this feature".to_string(),
            )),
        }
    }
}
