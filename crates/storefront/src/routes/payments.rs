//! Mock gateway routes.

use axum::{Json, extract::State};
use tracing::instrument;

use nevyra_core::api::{
    ApiResponse, CreatePaymentRequest, GatewayConfirmation, GatewayOrder, PaymentReceipt,
};

use super::ApiResult;
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::services::MockGateway;
use crate::state::AppState;

/// POST /api/payments/create-mock-order
#[instrument(skip_all, fields(user_id = %user.id, amount = request.amount))]
pub async fn create_mock_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CreatePaymentRequest>,
) -> ApiResult<GatewayOrder> {
    let order = MockGateway::new(state.db(), state.signer())
        .create(user.id, &request)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        order,
        "Mock payment order created",
    )))
}

/// POST /api/payments/verify-mock
#[instrument(skip_all, fields(user_id = %user.id, order_id = %confirmation.order_id))]
pub async fn verify_mock(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(confirmation): ApiJson<GatewayConfirmation>,
) -> ApiResult<PaymentReceipt> {
    let receipt = MockGateway::new(state.db(), state.signer())
        .verify(user.id, &confirmation)
        .await?;
    Ok(Json(ApiResponse::ok_with_message(
        receipt,
        "Payment verified successfully",
    )))
}
