//! HTTP surface: router, shared state and the three resource modules.

mod customers;
mod orders;
mod restaurants;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::error::AppError;
use crate::locks::RestaurantLocks;
use crate::placement::{Clock, PlacementRules, SystemClock};
use crate::store::Store;
use crate::validation::ValidationError;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub clock: Arc<dyn Clock>,
    pub placement: PlacementRules,
    pub locks: RestaurantLocks,
}

impl AppState {
    pub fn new(store: Store, clock: Arc<dyn Clock>, placement: PlacementRules) -> Self {
        Self {
            store,
            clock,
            placement,
            locks: RestaurantLocks::new(),
        }
    }

    /// State backed by the system clock.
    pub fn with_system_clock(store: Store, placement: PlacementRules) -> Self {
        Self::new(store, Arc::new(SystemClock), placement)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api_root))
        .route("/clientes/", get(customers::list).post(customers::create))
        .route(
            "/clientes/:id/",
            get(customers::retrieve)
                .put(customers::update)
                .patch(customers::partial_update)
                .delete(customers::destroy),
        )
        .route(
            "/restaurantes/",
            get(restaurants::list).post(restaurants::create),
        )
        .route(
            "/restaurantes/:id/",
            get(restaurants::retrieve)
                .put(restaurants::update)
                .patch(restaurants::partial_update)
                .delete(restaurants::destroy),
        )
        .route(
            "/restaurantes/:id/agregar_cliente/",
            post(restaurants::add_customer),
        )
        .route(
            "/restaurantes/:id/eliminar_cliente/",
            post(restaurants::remove_customer),
        )
        .route("/ordenes/", get(orders::list).post(orders::create))
        .route(
            "/ordenes/:id/",
            get(orders::retrieve)
                .put(orders::update)
                .patch(orders::update)
                .delete(orders::destroy),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn api_root() -> Json<Value> {
    Json(json!({
        "clientes": "/clientes/",
        "restaurantes": "/restaurantes/",
        "ordenes": "/ordenes/",
    }))
}

/// Logs a rejected business rule and turns it into a 400 response.
fn rejected(err: ValidationError) -> AppError {
    warn!(field = err.field, reason = %err.message, "request rejected");
    AppError::Validation(err)
}
