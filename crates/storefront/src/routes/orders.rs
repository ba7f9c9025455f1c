//! Order routes.
//!
//! Orders are priced here from the catalog; the client's totals are never
//! trusted. A repeated `Idempotency-Key` returns the order it first created.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use nevyra_core::api::{ApiResponse, CreateOrderRequest, IDEMPOTENCY_KEY_HEADER, OrderRecord};
use nevyra_core::{
    Cart, CurrencyCode, OrderId, OrderLine, OrderStatus, OrderTotals, PaymentMethod,
};

use super::{ApiResult, ok};
use crate::db::orders::{OrderRepository, Placement};
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// GET /api/orders
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> ApiResult<Vec<OrderRecord>> {
    Ok(ok(OrderRepository::new(state.db()).list_for_user(user.id).await))
}

/// POST /api/orders
#[instrument(skip_all, fields(user_id = %user.id, method = %request.payment.method))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    headers: HeaderMap,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderRecord>>)> {
    let idempotency_key = idempotency_key(&headers)?;

    let cart = Cart::normalized(
        request
            .items
            .into_iter()
            .map(|e| (e.product_id, i64::from(e.quantity))),
    );
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }
    let shipping = request.shipping.validate()?;

    let products = ProductRepository::new(state.db());
    let mut lines = Vec::with_capacity(cart.len());
    for entry in cart.into_entries() {
        let product = products
            .get(&entry.product_id)
            .await
            .ok_or_else(|| {
                AppError::BadRequest(format!("Unknown product: {}", entry.product_id))
            })?;
        if !product.in_stock {
            return Err(AppError::BadRequest(format!(
                "{} is out of stock",
                product.title
            )));
        }
        lines.push(OrderLine {
            product_id: product.id,
            title: product.title,
            unit_price: product.price,
            quantity: entry.quantity,
        });
    }

    let status = match request.payment.method {
        PaymentMethod::Gateway => OrderStatus::Confirmed,
        PaymentMethod::Cod => OrderStatus::Pending,
    };
    let record = OrderRecord {
        id: OrderId::generate(),
        status,
        payment: request.payment,
        shipping,
        totals: OrderTotals::compute(&lines, CurrencyCode::default()),
        lines,
        created_at: Utc::now(),
    };

    match OrderRepository::new(state.db())
        .place(user.id, idempotency_key, record)
        .await?
    {
        Placement::Created(record) => {
            let order_id = record.id.to_string();
            tracing::info!(order_id = %order_id, total = %record.totals.total, "Order placed");
            add_breadcrumb("order", "Order placed", Some(&[("order_id", order_id.as_str())]));
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok_with_message(
                    record,
                    "Order placed successfully",
                )),
            ))
        }
        Placement::Replayed(record) => {
            tracing::info!(order_id = %record.id, "Order request replayed");
            Ok((StatusCode::OK, ok(record)))
        }
    }
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> ApiResult<OrderRecord> {
    Ok(ok(OrderRepository::new(state.db()).get(user.id, id).await?))
}

/// PUT /api/orders/{id}/cancel
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> ApiResult<OrderRecord> {
    let record = OrderRepository::new(state.db()).cancel(user.id, id).await?;
    tracing::info!(order_id = %record.id, "Order cancelled");
    Ok(Json(ApiResponse::ok_with_message(record, "Order cancelled")))
}

/// Parse the optional `Idempotency-Key` header.
fn idempotency_key(headers: &HeaderMap) -> Result<Option<Uuid>> {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|s| Uuid::parse_str(s.trim()).ok())
                .ok_or_else(|| AppError::BadRequest("Invalid Idempotency-Key header".to_string()))
        })
        .transpose()
}
