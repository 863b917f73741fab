use crate::error::AppError;
use crate::models::{ApiMessage, ListOrdersParams};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use types::{AccountId, InvalidRequest, NewOrder, Order, OrderId};

/// Accept a submission and enqueue it for the match loop. The response only
/// acknowledges receipt; matching happens asynchronously.
pub async fn submit_order(
    State(state): State<AppState>,
    payload: Result<Json<NewOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiMessage>), AppError> {
    let Json(new) = payload
        .map_err(|rejection| AppError::from(InvalidRequest::Malformed(rejection.body_text())))?;

    state.engine.submit(new)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiMessage::new("order submitted successfully")),
    ))
}

/// Cancel a resting order by id. 404 when the order is unknown or already
/// terminal.
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiMessage>, AppError> {
    state.engine.cancel(OrderId::new(id)).await?;
    Ok(Json(ApiMessage::new("order cancelled successfully")))
}

/// Paginated listing of an account's orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state
        .store
        .orders_for_account(AccountId::new(params.account_id), params.page, params.size)
        .await?;
    Ok(Json(orders))
}
