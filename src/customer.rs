use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use validator::ValidateEmail;

use crate::store::Record;
use crate::validation::{text_within, Pipeline, ValidationError};

pub const MIN_AGE: i64 = 18;
const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{9,15}$").expect("phone pattern is valid"));

/// Writable customer fields, as accepted by create and full update.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomerData {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    pub edad: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Customer {
    pub id: u64,
    #[serde(flatten)]
    pub data: CustomerData,
}

impl Record for Customer {
    const KIND: &'static str = "customer";

    fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.data.nombre)
    }
}

/// Partial update body; absent fields keep their stored value.
#[derive(Debug, Deserialize, Default)]
pub struct CustomerPatch {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub edad: Option<i64>,
}

impl CustomerPatch {
    pub fn apply(self, base: &CustomerData) -> CustomerData {
        CustomerData {
            nombre: self.nombre.unwrap_or_else(|| base.nombre.clone()),
            email: self.email.unwrap_or_else(|| base.email.clone()),
            telefono: self.telefono.unwrap_or_else(|| base.telefono.clone()),
            edad: self.edad.unwrap_or(base.edad),
        }
    }
}

/// Validates a candidate customer against every stored customer.
///
/// `current` is the id of the record being updated, which is excluded from
/// the email uniqueness check.
pub fn validate(
    candidate: &CustomerData,
    existing: &[Customer],
    current: Option<u64>,
) -> Result<(), ValidationError> {
    let email_taken = |data: &CustomerData| {
        existing
            .iter()
            .filter(|c| Some(c.id) != current)
            .any(|c| c.data.email.eq_ignore_ascii_case(&data.email))
    };

    Pipeline::<CustomerData>::new()
        .rule(
            "nombre",
            format!("name must be non-blank and at most {MAX_NAME_LEN} characters"),
            |data: &CustomerData| text_within(&data.nombre, MAX_NAME_LEN),
        )
        .rule(
            "email",
            "enter a valid email address",
            |data: &CustomerData| data.email.len() <= MAX_EMAIL_LEN && data.email.validate_email(),
        )
        .rule(
            "email",
            "a customer with this email already exists",
            move |data: &CustomerData| !email_taken(data),
        )
        .rule(
            "telefono",
            "phone number must be in the format '+999999999' with 9 to 15 digits",
            |data: &CustomerData| PHONE_PATTERN.is_match(&data.telefono),
        )
        .rule(
            "edad",
            format!("customer must be at least {MIN_AGE} years old"),
            |data: &CustomerData| data.edad >= MIN_AGE,
        )
        .validate(candidate)
}
