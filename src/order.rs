use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::Record;
use crate::validation::{text_within, Pipeline, ValidationError};

const MAX_DESCRIPTION_LEN: usize = 255;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
}

serde_plain::derive_display_from_serialize!(OrderStatus);
serde_plain::derive_fromstr_from_deserialize!(OrderStatus);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Order {
    pub id: u64,
    pub descripcion: String,
    #[serde(default)]
    pub estado: OrderStatus,
    pub cliente: u64,
    pub restaurante: u64,
}

impl Record for Order {
    const KIND: &'static str = "order";

    fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "order {} of customer {} at restaurant {}",
            self.id, self.cliente, self.restaurante
        )
    }
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.estado == OrderStatus::Pending
    }

    pub fn belongs_to(&self, customer_id: u64, restaurant_id: u64) -> bool {
        self.cliente == customer_id && self.restaurante == restaurant_id
    }
}

/// Create body. A caller supplied `estado` is ignored: new orders always
/// start out pending.
#[derive(Debug, Deserialize)]
pub struct OrderInput {
    pub descripcion: String,
    pub cliente: u64,
    pub restaurante: u64,
}

/// Update body. Customer and restaurant are fixed once the order exists:
/// they may be echoed back unchanged but never reassigned.
#[derive(Debug, Deserialize, Default)]
pub struct OrderPatch {
    pub descripcion: Option<String>,
    pub estado: Option<OrderStatus>,
    pub cliente: Option<u64>,
    pub restaurante: Option<u64>,
}

impl OrderPatch {
    /// Rejects a patch that tries to move the order to another customer or
    /// restaurant.
    pub fn check_fixed(&self, base: &Order) -> Result<(), ValidationError> {
        Pipeline::<OrderPatch>::new()
            .rule(
                "cliente",
                "the customer of an existing order cannot be changed",
                |patch: &OrderPatch| patch.cliente.map_or(true, |id| id == base.cliente),
            )
            .rule(
                "restaurante",
                "the restaurant of an existing order cannot be changed",
                |patch: &OrderPatch| patch.restaurante.map_or(true, |id| id == base.restaurante),
            )
            .validate(self)
    }

    pub fn apply(self, base: &Order) -> Order {
        Order {
            descripcion: self.descripcion.unwrap_or_else(|| base.descripcion.clone()),
            estado: self.estado.unwrap_or(base.estado),
            ..base.clone()
        }
    }
}

/// Validates an order description.
///
/// # Arguments
/// * `descripcion` - The description to check
///
/// # Returns
/// * `Result<(), ValidationError>` - The `descripcion` error if blank or too long
pub fn validate_description(descripcion: &str) -> Result<(), ValidationError> {
    Pipeline::<str>::new()
        .rule(
            "descripcion",
            format!("description must be non-blank and at most {MAX_DESCRIPTION_LEN} characters"),
            |value: &str| text_within(value, MAX_DESCRIPTION_LEN),
        )
        .validate(descripcion)
}

/// Validates an update of an order.
///
/// # Arguments
/// * `current` - The stored order
/// * `candidate` - The order as it would be saved
///
/// # Returns
/// * `Result<(), ValidationError>` - The first failing rule, if any
pub fn validate_update(current: &Order, candidate: &Order) -> Result<(), ValidationError> {
    validate_description(&candidate.descripcion)?;
    Pipeline::<Order>::new()
        .rule(
            "estado",
            "a completed order cannot be reopened",
            |next: &Order| !(current.estado == OrderStatus::Completed && next.is_pending()),
        )
        .validate(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(estado: OrderStatus) -> Order {
        Order {
            id: 1,
            descripcion: "Ropa vieja".to_string(),
            estado,
            cliente: 2,
            restaurante: 3,
        }
    }

    #[test]
    fn status_round_trips_as_plain_lowercase() {
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
        assert_eq!("completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert!("cancelled".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 1, "descripcion": "Tostones", "cliente": 2, "restaurante": 3
        }))
        .unwrap();
        assert!(order.is_pending());
    }

    #[test]
    fn pending_order_can_be_completed() {
        let current = order(OrderStatus::Pending);
        let next = OrderPatch {
            estado: Some(OrderStatus::Completed),
            ..Default::default()
        }
        .apply(&current);
        assert!(validate_update(&current, &next).is_ok());
        assert_eq!(next.cliente, current.cliente);
    }

    #[test]
    fn completed_order_cannot_be_reopened() {
        let current = order(OrderStatus::Completed);
        let next = OrderPatch {
            estado: Some(OrderStatus::Pending),
            ..Default::default()
        }
        .apply(&current);
        assert_eq!(validate_update(&current, &next).unwrap_err().field, "estado");
    }

    #[test]
    fn completed_order_description_can_change() {
        let current = order(OrderStatus::Completed);
        let next = OrderPatch {
            descripcion: Some("Ropa vieja y tostones".to_string()),
            ..Default::default()
        }
        .apply(&current);
        assert!(validate_update(&current, &next).is_ok());
    }

    #[test]
    fn patch_cannot_reassign_customer_or_restaurant() {
        let current = order(OrderStatus::Pending);
        let moved = OrderPatch {
            cliente: Some(9),
            ..Default::default()
        };
        assert_eq!(moved.check_fixed(&current).unwrap_err().field, "cliente");

        let moved = OrderPatch {
            restaurante: Some(9),
            ..Default::default()
        };
        assert_eq!(moved.check_fixed(&current).unwrap_err().field, "restaurante");

        let echoed = OrderPatch {
            cliente: Some(2),
            restaurante: Some(3),
            ..Default::default()
        };
        assert!(echoed.check_fixed(&current).is_ok());
    }

    #[test]
    fn rejects_blank_description() {
        assert_eq!(validate_description("").unwrap_err().field, "descripcion");
        assert!(validate_description("Moros y cristianos").is_ok());
    }

    #[test]
    fn membership_pair_matching() {
        let o = order(OrderStatus::Pending);
        assert!(o.belongs_to(2, 3));
        assert!(!o.belongs_to(3, 2));
    }
}
