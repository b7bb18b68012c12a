use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use super::{rejected, AppState};
use crate::customer::Customer;
use crate::error::{AppError, AppResult};
use crate::order::{self, Order, OrderInput, OrderPatch, OrderStatus};
use crate::restaurant::Restaurant;
use crate::store::Record;
use crate::validation::ValidationError;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Order>>> {
    let orders = state.store.list::<Order>()?;
    debug!(count = orders.len(), "listed orders");
    Ok(Json(orders))
}

pub async fn retrieve(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<Order>> {
    let Path(id) = path?;
    Ok(Json(state.store.fetch::<Order>(id)?))
}

fn unknown(field: &'static str, kind: &str, id: u64) -> AppError {
    rejected(ValidationError::new(field, format!("{kind} {id} does not exist")))
}

/// Creates a pending order once the placement rules pass.
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let Json(input) = payload?;
    order::validate_description(&input.descripcion).map_err(rejected)?;

    let customer = state
        .store
        .get::<Customer>(input.cliente)?
        .ok_or_else(|| unknown("cliente", Customer::KIND, input.cliente))?;

    let _guard = state.locks.acquire(input.restaurante).await?;
    let restaurant = state
        .store
        .get::<Restaurant>(input.restaurante)?
        .ok_or_else(|| unknown("restaurante", Restaurant::KIND, input.restaurante))?;

    let orders = state.store.list::<Order>()?;
    state
        .placement
        .check(&customer, &restaurant, &orders, state.clock.now())
        .map_err(rejected)?;

    let order = Order {
        id: state.store.next_id::<Order>()?,
        descripcion: input.descripcion,
        estado: OrderStatus::Pending,
        cliente: customer.id,
        restaurante: restaurant.id,
    };
    state.store.save(&order)?;
    info!(
        order_id = order.id,
        customer_id = order.cliente,
        restaurant_id = order.restaurante,
        "placed order"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

/// Serves both PUT and PATCH: only `descripcion` and `estado` are writable.
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<OrderPatch>, JsonRejection>,
) -> AppResult<Json<Order>> {
    let Path(id) = path?;
    let current = state.store.fetch::<Order>(id)?;
    let Json(patch) = payload?;
    patch.check_fixed(&current).map_err(rejected)?;
    let next = patch.apply(&current);
    order::validate_update(&current, &next).map_err(rejected)?;

    state.store.save(&next)?;
    info!(order_id = id, from = %current.estado, to = %next.estado, "updated order");
    Ok(Json(next))
}

pub async fn destroy(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    if !state.store.delete::<Order>(id)? {
        return Err(AppError::not_found(Order::KIND, id));
    }
    info!(order_id = id, "deleted order");
    Ok(StatusCode::NO_CONTENT)
}
