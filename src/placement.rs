//! Order placement rules.
//!
//! A new order must pass, in order:
//!
//! 1. the customer is a member of the restaurant,
//! 2. the restaurant is open at the current local time of the reference
//!    time zone (inclusive bounds, same-day window),
//! 3. the customer has no pending order at that restaurant.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::customer::Customer;
use crate::order::Order;
use crate::restaurant::Restaurant;
use crate::validation::{Pipeline, ValidationError, NON_FIELD_ERRORS};

pub const NOT_ASSOCIATED: &str = "customer not associated with restaurant";
pub const CLOSED: &str = "restaurant is closed";
pub const PENDING_EXISTS: &str = "customer already has a pending order";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PlacementRules {
    timezone: Tz,
}

struct Placement<'a> {
    customer: &'a Customer,
    restaurant: &'a Restaurant,
    local_time: NaiveTime,
    orders: &'a [Order],
}

impl PlacementRules {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveTime {
        now.with_timezone(&self.timezone).time()
    }

    /// Checks whether `customer` may place a new order at `restaurant`.
    /// `orders` is every stored order; only those for the same pair matter.
    pub fn check(
        &self,
        customer: &Customer,
        restaurant: &Restaurant,
        orders: &[Order],
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let placement = Placement {
            customer,
            restaurant,
            local_time: self.local_time(now),
            orders,
        };

        Pipeline::<Placement>::new()
            .rule(NON_FIELD_ERRORS, NOT_ASSOCIATED, |p| {
                p.restaurant.is_member(p.customer.id)
            })
            .rule(NON_FIELD_ERRORS, CLOSED, |p| p.restaurant.is_open_at(p.local_time))
            .rule(NON_FIELD_ERRORS, PENDING_EXISTS, |p| {
                !p.orders
                    .iter()
                    .any(|o| o.belongs_to(p.customer.id, p.restaurant.id) && o.is_pending())
            })
            .validate(&placement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::CustomerData;
    use crate::order::OrderStatus;
    use crate::restaurant::RestaurantData;
    use chrono::TimeZone;

    fn customer(id: u64) -> Customer {
        Customer {
            id,
            data: CustomerData {
                nombre: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                telefono: "+5351234567".to_string(),
                edad: 30,
            },
        }
    }

    fn restaurant(clientes: Vec<u64>) -> Restaurant {
        Restaurant {
            id: 5,
            created_at: Utc::now(),
            data: RestaurantData {
                nombre: "La Guarida".to_string(),
                direccion: "Concordia 418".to_string(),
                capacidad: 10,
                clientes,
                opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                closing_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            },
        }
    }

    fn order(id: u64, cliente: u64, restaurante: u64, estado: OrderStatus) -> Order {
        Order {
            id,
            descripcion: "Langosta".to_string(),
            estado,
            cliente,
            restaurante,
        }
    }

    fn rules() -> PlacementRules {
        PlacementRules::new(chrono_tz::America::Havana)
    }

    /// 2024-01-15 is standard time in Havana (UTC-5).
    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, 0).unwrap()
    }

    #[test]
    fn converts_to_reference_time_zone() {
        assert_eq!(
            rules().local_time(utc(20, 0)),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap()
        );
    }

    #[test]
    fn member_inside_hours_without_pending_order_may_order() {
        let orders = [order(1, 1, 5, OrderStatus::Completed), order(2, 1, 6, OrderStatus::Pending)];
        assert!(rules()
            .check(&customer(1), &restaurant(vec![1]), &orders, utc(20, 0))
            .is_ok());
    }

    #[test]
    fn non_member_is_rejected_before_hours() {
        let err = rules()
            .check(&customer(1), &restaurant(vec![2]), &[], utc(4, 0))
            .unwrap_err();
        assert_eq!(err.message, NOT_ASSOCIATED);
    }

    #[test]
    fn closed_outside_window() {
        // 04:00 UTC is 23:00 local on the previous day.
        let err = rules()
            .check(&customer(1), &restaurant(vec![1]), &[], utc(4, 0))
            .unwrap_err();
        assert_eq!(err.message, CLOSED);

        // 13:59 UTC is 08:59 local.
        let err = rules()
            .check(&customer(1), &restaurant(vec![1]), &[], utc(13, 59))
            .unwrap_err();
        assert_eq!(err.message, CLOSED);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let r = restaurant(vec![1]);
        assert!(rules().check(&customer(1), &r, &[], utc(14, 0)).is_ok());
        // 22:00 local on the 15th is 03:00 UTC on the 16th.
        let closing = Utc.with_ymd_and_hms(2024, 1, 16, 3, 0, 0).unwrap();
        assert!(rules().check(&customer(1), &r, &[], closing).is_ok());
    }

    #[test]
    fn pending_order_blocks_a_second_one() {
        let orders = [order(1, 1, 5, OrderStatus::Pending)];
        let err = rules()
            .check(&customer(1), &restaurant(vec![1]), &orders, utc(20, 0))
            .unwrap_err();
        assert_eq!(err.message, PENDING_EXISTS);
        assert_eq!(err.field, NON_FIELD_ERRORS);
    }

    #[test]
    fn fixed_clock_reports_its_instant() {
        let clock = FixedClock(utc(12, 30));
        assert_eq!(clock.now(), utc(12, 30));
    }
}
