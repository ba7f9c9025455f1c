//! Account routes.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use nevyra_core::api::{
    ApiResponse, AuthPayload, LoginRequest, ProfileUpdate, RegisterRequest, UserProfile,
};

use super::{ApiResult, ok};
use crate::db::users::UserRepository;
use crate::error::{Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::services::AuthService;
use crate::state::AppState;

/// POST /api/auth/register
#[instrument(skip_all, fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthPayload>>)> {
    let (user, token) = AuthService::new(state.db()).register(&request).await?;
    tracing::info!(user_id = %user.id, "User registered");
    add_breadcrumb("auth", "Registered", None);

    let payload = AuthPayload {
        token,
        user: user.profile(state.config().is_admin(&user.email)),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(payload, "Registration successful")),
    ))
}

/// POST /api/auth/login
#[instrument(skip_all, fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<AuthPayload> {
    let (user, token) = AuthService::new(state.db())
        .login(&request.email, &request.password)
        .await
        .inspect_err(|e| tracing::warn!("Login failed: {e}"))?;

    Ok(Json(ApiResponse::ok_with_message(
        AuthPayload {
            token,
            user: user.profile(state.config().is_admin(&user.email)),
        },
        "Login successful",
    )))
}

/// GET /api/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> ApiResult<UserProfile> {
    Ok(ok(user.profile(state.config().is_admin(&user.email))))
}

/// PUT /api/auth/profile
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<UserProfile> {
    let updated = UserRepository::new(state.db())
        .update_profile(user.id, &update)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        updated.profile(state.config().is_admin(&updated.email)),
        "Profile updated",
    )))
}
