use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::Record;
use crate::validation::{text_within, Pipeline, ValidationError, NON_FIELD_ERRORS};

const MAX_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 255;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RestaurantData {
    pub nombre: String,
    pub direccion: String,
    pub capacidad: i64,
    /// Member customer ids.
    #[serde(default)]
    pub clientes: Vec<u64>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Restaurant {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: RestaurantData,
}

impl Record for Restaurant {
    const KIND: &'static str = "restaurant";

    fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for Restaurant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.data.nombre)
    }
}

impl Restaurant {
    pub fn is_member(&self, customer_id: u64) -> bool {
        self.data.clientes.contains(&customer_id)
    }

    pub fn member_count(&self) -> i64 {
        self.data.clientes.len() as i64
    }

    pub fn remaining_capacity(&self) -> i64 {
        (self.data.capacidad - self.member_count()).max(0)
    }

    pub fn has_room(&self) -> bool {
        self.member_count() < self.data.capacidad
    }

    /// Inclusive same-day window check.
    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        self.data.opening_time <= time && time <= self.data.closing_time
    }
}

/// Create and full-update body. Omitting `clientes` on update keeps the
/// current members.
#[derive(Debug, Deserialize)]
pub struct RestaurantInput {
    pub nombre: String,
    pub direccion: String,
    pub capacidad: i64,
    pub clientes: Option<Vec<u64>>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

impl RestaurantInput {
    pub fn into_data(self, current_members: &[u64]) -> RestaurantData {
        RestaurantData {
            nombre: self.nombre,
            direccion: self.direccion,
            capacidad: self.capacidad,
            clientes: dedup(self.clientes.unwrap_or_else(|| current_members.to_vec())),
            opening_time: self.opening_time,
            closing_time: self.closing_time,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RestaurantPatch {
    pub nombre: Option<String>,
    pub direccion: Option<String>,
    pub capacidad: Option<i64>,
    pub clientes: Option<Vec<u64>>,
    pub opening_time: Option<NaiveTime>,
    pub closing_time: Option<NaiveTime>,
}

impl RestaurantPatch {
    pub fn apply(self, base: &RestaurantData) -> RestaurantData {
        RestaurantData {
            nombre: self.nombre.unwrap_or_else(|| base.nombre.clone()),
            direccion: self.direccion.unwrap_or_else(|| base.direccion.clone()),
            capacidad: self.capacidad.unwrap_or(base.capacidad),
            clientes: dedup(self.clientes.unwrap_or_else(|| base.clientes.clone())),
            opening_time: self.opening_time.unwrap_or(base.opening_time),
            closing_time: self.closing_time.unwrap_or(base.closing_time),
        }
    }
}

fn dedup(ids: Vec<u64>) -> Vec<u64> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Validates a candidate restaurant. `known_customers` holds the ids of every
/// stored customer, used to resolve the member list.
pub fn validate(
    candidate: &RestaurantData,
    known_customers: &[u64],
) -> Result<(), ValidationError> {
    Pipeline::<RestaurantData>::new()
        .rule(
            "nombre",
            format!("name must be non-blank and at most {MAX_NAME_LEN} characters"),
            |data: &RestaurantData| text_within(&data.nombre, MAX_NAME_LEN),
        )
        .rule(
            "direccion",
            format!("address must be non-blank and at most {MAX_ADDRESS_LEN} characters"),
            |data: &RestaurantData| text_within(&data.direccion, MAX_ADDRESS_LEN),
        )
        .rule(
            "capacidad",
            "capacity must be a positive number",
            |data: &RestaurantData| data.capacidad > 0,
        )
        .rule(
            "clientes",
            "one or more customers do not exist",
            |data: &RestaurantData| data.clientes.iter().all(|id| known_customers.contains(id)),
        )
        .rule(
            NON_FIELD_ERRORS,
            "the number of customers cannot exceed the restaurant capacity",
            |data: &RestaurantData| data.clientes.len() as i64 <= data.capacidad,
        )
        .rule(
            NON_FIELD_ERRORS,
            "opening time must be earlier than closing time",
            |data: &RestaurantData| data.opening_time < data.closing_time,
        )
        .validate(candidate)
}
