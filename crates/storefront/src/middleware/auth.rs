//! Bearer token extractors.
//!
//! Handlers that need a signed-in user take [`RequireAuth`]; admin
//! listings take [`RequireAdmin`]. Both reject with the JSON envelope.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid `Authorization: Bearer <token>`.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::InvalidSession)?;
        let user = AuthService::new(state.db()).authenticate(token).await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

/// Extractor that requires a signed-in user listed in `NEVYRA_ADMIN_EMAILS`.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !state.config().is_admin(&user.email) {
            tracing::warn!(user_id = %user.id, "Admin access denied");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(user))
    }
}

/// The token of an `Authorization: Bearer` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
