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
use crate::customer::{self, Customer, CustomerData, CustomerPatch};
use crate::error::{AppError, AppResult};
use crate::restaurant::Restaurant;
use crate::store::Record;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let customers = state.store.list::<Customer>()?;
    debug!(count = customers.len(), "listed customers");
    Ok(Json(customers))
}

pub async fn retrieve(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<Customer>> {
    let Path(id) = path?;
    Ok(Json(state.store.fetch::<Customer>(id)?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CustomerData>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let Json(data) = payload?;
    let existing = state.store.list::<Customer>()?;
    customer::validate(&data, &existing, None).map_err(rejected)?;

    let customer = Customer {
        id: state.store.next_id::<Customer>()?,
        data,
    };
    state.store.save(&customer)?;
    info!(customer_id = customer.id, "created customer");

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<CustomerData>, JsonRejection>,
) -> AppResult<Json<Customer>> {
    let Path(id) = path?;
    let current = state.store.fetch::<Customer>(id)?;
    let Json(data) = payload?;
    replace(&state, current, data).map(Json)
}

pub async fn partial_update(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<CustomerPatch>, JsonRejection>,
) -> AppResult<Json<Customer>> {
    let Path(id) = path?;
    let current = state.store.fetch::<Customer>(id)?;
    let Json(patch) = payload?;
    let data = patch.apply(&current.data);
    replace(&state, current, data).map(Json)
}

fn replace(state: &AppState, current: Customer, data: CustomerData) -> AppResult<Customer> {
    let existing = state.store.list::<Customer>()?;
    customer::validate(&data, &existing, Some(current.id)).map_err(rejected)?;

    let customer = Customer {
        id: current.id,
        data,
    };
    state.store.save(&customer)?;
    info!(customer_id = customer.id, "updated customer");
    Ok(customer)
}

/// Holds every restaurant lock while cascading, so no membership change or
/// order placement can slip in for the customer being deleted.
pub async fn destroy(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    let mut restaurant_ids: Vec<u64> = state
        .store
        .list::<Restaurant>()?
        .iter()
        .map(|r| r.id)
        .collect();
    restaurant_ids.sort_unstable();

    let mut guards = Vec::with_capacity(restaurant_ids.len());
    for restaurant_id in restaurant_ids {
        guards.push(state.locks.acquire(restaurant_id).await?);
    }

    if !state.store.delete_customer(id)? {
        return Err(AppError::not_found(Customer::KIND, id));
    }
    drop(guards);
    info!(customer_id = id, "deleted customer");
    Ok(StatusCode::NO_CONTENT)
}
