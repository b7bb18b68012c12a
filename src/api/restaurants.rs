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
use crate::membership::{self, MemberAdded, MemberRemoved, MembershipRequest};
use crate::restaurant::{self, Restaurant, RestaurantData, RestaurantInput, RestaurantPatch};
use crate::store::Record;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Restaurant>>> {
    let restaurants = state.store.list::<Restaurant>()?;
    debug!(count = restaurants.len(), "listed restaurants");
    Ok(Json(restaurants))
}

pub async fn retrieve(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<Restaurant>> {
    let Path(id) = path?;
    Ok(Json(state.store.fetch::<Restaurant>(id)?))
}

fn validate(state: &AppState, data: &RestaurantData) -> AppResult<()> {
    let known: Vec<u64> = state
        .store
        .list::<Customer>()?
        .iter()
        .map(|c| c.id)
        .collect();
    restaurant::validate(data, &known).map_err(rejected)
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<RestaurantInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Restaurant>)> {
    let Json(input) = payload?;
    let data = input.into_data(&[]);
    validate(&state, &data)?;

    let restaurant = Restaurant {
        id: state.store.next_id::<Restaurant>()?,
        created_at: state.clock.now(),
        data,
    };
    state.store.save(&restaurant)?;
    info!(
        restaurant_id = restaurant.id,
        capacity = restaurant.data.capacidad,
        "created restaurant"
    );

    Ok((StatusCode::CREATED, Json(restaurant)))
}

pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<RestaurantInput>, JsonRejection>,
) -> AppResult<Json<Restaurant>> {
    let Path(id) = path?;
    let _guard = state.locks.acquire(id).await?;
    let current = state.store.fetch::<Restaurant>(id)?;
    let Json(input) = payload?;
    let data = input.into_data(&current.data.clientes);
    replace(&state, current, data).map(Json)
}

pub async fn partial_update(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<RestaurantPatch>, JsonRejection>,
) -> AppResult<Json<Restaurant>> {
    let Path(id) = path?;
    let _guard = state.locks.acquire(id).await?;
    let current = state.store.fetch::<Restaurant>(id)?;
    let Json(patch) = payload?;
    let data = patch.apply(&current.data);
    replace(&state, current, data).map(Json)
}

/// `created_at` is kept from the stored record.
fn replace(state: &AppState, current: Restaurant, data: RestaurantData) -> AppResult<Restaurant> {
    validate(state, &data)?;

    let restaurant = Restaurant { data, ..current };
    state.store.save(&restaurant)?;
    info!(restaurant_id = restaurant.id, "updated restaurant");
    Ok(restaurant)
}

pub async fn destroy(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    let deleted = {
        let _guard = state.locks.acquire(id).await?;
        state.store.delete_restaurant(id)?
    };
    if !deleted {
        return Err(AppError::not_found(Restaurant::KIND, id));
    }
    state.locks.forget(id);
    info!(restaurant_id = id, "deleted restaurant");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /restaurantes/:id/agregar_cliente/
pub async fn add_customer(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<MembershipRequest>, JsonRejection>,
) -> AppResult<Json<MemberAdded>> {
    let Path(id) = path?;
    let _guard = state.locks.acquire(id).await?;
    let mut restaurant = state.store.fetch::<Restaurant>(id)?;
    let Json(request) = payload?;
    let customer = state.store.get::<Customer>(request.cliente_id)?;

    let added = membership::add_member(&mut restaurant, request.cliente_id, customer.as_ref())
        .map_err(|err| rejected(err.into()))?;
    state.store.save(&restaurant)?;
    info!(
        restaurant_id = id,
        customer_id = request.cliente_id,
        members = restaurant.member_count(),
        "added restaurant member"
    );

    Ok(Json(added))
}

/// POST /restaurantes/:id/eliminar_cliente/
pub async fn remove_customer(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    payload: Result<Json<MembershipRequest>, JsonRejection>,
) -> AppResult<Json<MemberRemoved>> {
    let Path(id) = path?;
    let _guard = state.locks.acquire(id).await?;
    let mut restaurant = state.store.fetch::<Restaurant>(id)?;
    let Json(request) = payload?;
    let customer = state.store.get::<Customer>(request.cliente_id)?;

    let removed = membership::remove_member(&mut restaurant, request.cliente_id, customer.as_ref())
        .map_err(|err| rejected(err.into()))?;
    state.store.save(&restaurant)?;
    info!(
        restaurant_id = id,
        customer_id = request.cliente_id,
        members = removed.clientes_actuales,
        "removed restaurant member"
    );

    Ok(Json(removed))
}
