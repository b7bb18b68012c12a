//! Restaurant API Service
//!
//! A REST backend for customers, restaurants and the orders customers place
//! at the restaurants they belong to.
//!
//! # Architecture
//!
//! ## Core Components
//!
//! * `api` - RESTful API endpoints using Axum framework
//! * `validation` - Ordered rule pipeline shared by every validator
//! * `customer` / `restaurant` / `order` - Records and their validation rules
//! * `membership` - Adding and removing restaurant members
//! * `placement` - Rules a new order has to pass, plus the injected clock
//! * `store` - Persistence over Redis or an in-process backend
//! * `locks` - Per-restaurant serialisation of multi-step rule checks
//! * `config` - Environment configuration
//! * `error` - Error handling and HTTP response mapping
//!
//! ## Design
//!
//! ### API Layer (`api`)
//! - Built with Axum web framework
//! - One module per resource, shared application state
//! - Request tracing through `tower-http`
//!
//! ### Storage Layer (`store`)
//! - Redis for persistence, one JSON document per record
//! - In-memory backend for tests and local runs
//! - Deletes cascade: a customer takes its orders and memberships with it,
//!   a restaurant its orders
//!
//! ### Business Rules
//! - Customers: unique email, phone pattern, minimum age of 18
//! - Restaurants: positive capacity, opening strictly before closing,
//!   members never exceed capacity
//! - Orders: customer must be a member, restaurant must be open in the
//!   reference time zone, at most one pending order per customer and
//!   restaurant
//!
//! # Environment Configuration
//!
//! ```bash
//! HOST=127.0.0.1                        # Server host
//! PORT=3000                             # Server port
//! STORE=redis                           # redis | memory
//! REDIS_URL=redis://127.0.0.1/          # Redis connection URL
//! RESTAURANT_TIMEZONE=America/Havana    # Time zone for opening hours
//! RUST_LOG=info                         # Logging level
//! ```
//!
//! # Error Handling
//!
//! Every failure is an `AppError`:
//! - Validation failures answer 400 with `{"field": ["message"]}`
//! - Unknown ids in the path answer 404 with `{"detail": "..."}`
//! - Redis, JSON and store failures answer 500
//!
//! # API Endpoints
//!
//! | Method | Path | |
//! |--------|------|-|
//! | GET, POST | `/clientes/` | list, create |
//! | GET, PUT, PATCH, DELETE | `/clientes/:id/` | retrieve, update, delete |
//! | GET, POST | `/restaurantes/` | list, create |
//! | GET, PUT, PATCH, DELETE | `/restaurantes/:id/` | retrieve, update, delete |
//! | POST | `/restaurantes/:id/agregar_cliente/` | add a member |
//! | POST | `/restaurantes/:id/eliminar_cliente/` | remove a member |
//! | GET, POST | `/ordenes/` | list, place an order |
//! | GET, PUT, PATCH, DELETE | `/ordenes/:id/` | retrieve, update, delete |
//!
//! ## POST /restaurantes/:id/agregar_cliente/
//!
//! ### Request
//! ```json
//! { "cliente_id": 1 }
//! ```
//!
//! ### Response
//! ```json
//! { "message": "Customer Ana added to restaurant El Floridita" }
//! ```
//!
//! ## POST /restaurantes/:id/eliminar_cliente/
//!
//! ### Response
//! ```json
//! {
//!   "message": "Customer Ana removed from restaurant El Floridita",
//!   "clientes_actuales": 0,
//!   "capacidad_restante": 20
//! }
//! ```

pub mod api;
pub mod config;
pub mod customer;
pub mod error;
pub mod locks;
pub mod membership;
pub mod order;
pub mod placement;
pub mod restaurant;
pub mod store;
pub mod validation;
