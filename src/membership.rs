//! Customer ↔ restaurant membership rules.
//!
//! Both operations work on freshly loaded state and check their
//! preconditions in a fixed order: the customer exists, then the current
//! relation, then (for adds) the remaining capacity.

use serde::{Deserialize, Serialize};

use crate::customer::Customer;
use crate::restaurant::Restaurant;
use crate::validation::ValidationError;

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub cliente_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("customer {0} does not exist")]
    CustomerNotFound(u64),
    #[error("this customer is already associated with this restaurant")]
    AlreadyMember,
    #[error("this customer is not associated with this restaurant")]
    NotMember,
    #[error("the restaurant has reached its maximum capacity")]
    CapacityExceeded,
}

impl From<MembershipError> for ValidationError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::CustomerNotFound(_) => ValidationError::new("cliente_id", err.to_string()),
            _ => ValidationError::non_field(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MemberAdded {
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MemberRemoved {
    pub message: String,
    pub clientes_actuales: i64,
    pub capacidad_restante: i64,
}

/// Adds a customer to the restaurant's members.
///
/// # Arguments
/// * `restaurant` - Freshly loaded restaurant, updated in place on success
/// * `customer_id` - The requested customer id
/// * `customer` - The resolved customer, `None` when the id did not resolve
///
/// # Returns
/// * `Result<MemberAdded, MembershipError>` - The confirmation body, or the
///   first precondition that failed
pub fn add_member(
    restaurant: &mut Restaurant,
    customer_id: u64,
    customer: Option<&Customer>,
) -> Result<MemberAdded, MembershipError> {
    let customer = customer.ok_or(MembershipError::CustomerNotFound(customer_id))?;
    if restaurant.is_member(customer.id) {
        return Err(MembershipError::AlreadyMember);
    }
    if !restaurant.has_room() {
        return Err(MembershipError::CapacityExceeded);
    }

    restaurant.data.clientes.push(customer.id);
    Ok(MemberAdded {
        message: format!("Customer {customer} added to restaurant {restaurant}"),
    })
}

/// Removes a customer from the restaurant's members.
///
/// # Arguments
/// * `restaurant` - Freshly loaded restaurant, updated in place on success
/// * `customer_id` - The requested customer id
/// * `customer` - The resolved customer, `None` when the id did not resolve
///
/// # Returns
/// * `Result<MemberRemoved, MembershipError>` - The confirmation body with
///   the member count and remaining capacity after the removal
pub fn remove_member(
    restaurant: &mut Restaurant,
    customer_id: u64,
    customer: Option<&Customer>,
) -> Result<MemberRemoved, MembershipError> {
    let customer = customer.ok_or(MembershipError::CustomerNotFound(customer_id))?;
    if !restaurant.is_member(customer.id) {
        return Err(MembershipError::NotMember);
    }

    restaurant.data.clientes.retain(|id| *id != customer.id);
    Ok(MemberRemoved {
        message: format!("Customer {customer} removed from restaurant {restaurant}"),
        clientes_actuales: restaurant.member_count(),
        capacidad_restante: restaurant.remaining_capacity(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::CustomerData;
    use crate::restaurant::RestaurantData;
    use chrono::{NaiveTime, Utc};

    fn customer(id: u64, nombre: &str) -> Customer {
        Customer {
            id,
            data: CustomerData {
                nombre: nombre.to_string(),
                email: format!("{id}@example.com"),
                telefono: "+5351234567".to_string(),
                edad: 25,
            },
        }
    }

    fn restaurant(capacidad: i64, clientes: Vec<u64>) -> Restaurant {
        Restaurant {
            id: 10,
            created_at: Utc::now(),
            data: RestaurantData {
                nombre: "El Floridita".to_string(),
                direccion: "Obispo 557".to_string(),
                capacidad,
                clientes,
                opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                closing_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            },
        }
    }

    #[test]
    fn adds_member_with_names_in_message() {
        let mut r = restaurant(2, vec![]);
        let added = add_member(&mut r, 1, Some(&customer(1, "Ana"))).unwrap();
        assert_eq!(added.message, "Customer Ana added to restaurant El Floridita");
        assert!(r.is_member(1));
    }

    #[test]
    fn unknown_customer_is_reported_first() {
        let mut r = restaurant(0, vec![]);
        assert_eq!(
            add_member(&mut r, 99, None),
            Err(MembershipError::CustomerNotFound(99))
        );
        assert_eq!(
            remove_member(&mut r, 99, None),
            Err(MembershipError::CustomerNotFound(99))
        );
    }

    #[test]
    fn adding_existing_member_conflicts_before_capacity() {
        let mut r = restaurant(1, vec![1]);
        assert_eq!(
            add_member(&mut r, 1, Some(&customer(1, "Ana"))),
            Err(MembershipError::AlreadyMember)
        );
    }

    #[test]
    fn full_restaurant_rejects_new_member() {
        let mut r = restaurant(1, vec![1]);
        assert_eq!(
            add_member(&mut r, 2, Some(&customer(2, "Luis"))),
            Err(MembershipError::CapacityExceeded)
        );
        assert_eq!(r.member_count(), 1);
    }

    #[test]
    fn removing_non_member_conflicts() {
        let mut r = restaurant(3, vec![1]);
        assert_eq!(
            remove_member(&mut r, 2, Some(&customer(2, "Luis"))),
            Err(MembershipError::NotMember)
        );
    }

    #[test]
    fn removal_reports_counts_after_removal() {
        let mut r = restaurant(3, vec![1, 2]);
        let removed = remove_member(&mut r, 1, Some(&customer(1, "Ana"))).unwrap();
        assert_eq!(removed.clientes_actuales, 1);
        assert_eq!(removed.capacidad_restante, 2);
        assert_eq!(removed.message, "Customer Ana removed from restaurant El Floridita");
        assert!(!r.is_member(1));
    }

    #[test]
    fn errors_map_to_request_fields() {
        assert_eq!(
            ValidationError::from(MembershipError::CustomerNotFound(4)).field,
            "cliente_id"
        );
        assert_eq!(
            ValidationError::from(MembershipError::CapacityExceeded).field,
            crate::validation::NON_FIELD_ERRORS
        );
    }
}
