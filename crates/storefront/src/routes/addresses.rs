//! Address book routes. Every mutation answers with the full list.

use axum::{Json, extract::State};
use tracing::instrument;

use nevyra_core::api::ApiResponse;
use nevyra_core::{Address, AddressId, AddressInput};

use super::{ApiResult, ok};
use crate::db::addresses::AddressRepository;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// GET /api/users/addresses
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> ApiResult<Vec<Address>> {
    Ok(ok(AddressRepository::new(state.db()).list(user.id).await))
}

/// POST /api/users/addresses
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(input): ApiJson<AddressInput>,
) -> ApiResult<Vec<Address>> {
    let details = input.validate()?;
    let book = AddressRepository::new(state.db()).add(user.id, details).await;
    Ok(Json(ApiResponse::ok_with_message(book, "Address added")))
}

/// PUT /api/users/addresses/{id}
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(input): ApiJson<AddressInput>,
) -> ApiResult<Vec<Address>> {
    let details = input.validate()?;
    let book = AddressRepository::new(state.db())
        .update(user.id, id, details)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(book, "Address updated")))
}

/// DELETE /api/users/addresses/{id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> ApiResult<Vec<Address>> {
    let book = AddressRepository::new(state.db()).delete(user.id, id).await?;
    Ok(Json(ApiResponse::ok_with_message(book, "Address deleted")))
}

/// PUT /api/users/addresses/{id}/default
pub async fn set_default(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> ApiResult<Vec<Address>> {
    let book = AddressRepository::new(state.db())
        .set_default(user.id, id)
        .await?;
    Ok(ok(book))
}
