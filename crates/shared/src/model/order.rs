use crate::domain::enums::{OrderStatus, PaymentMethod, PaymentStatus, PlacementState};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const FREE_DELIVERY_THRESHOLD: i64 = 499;
pub const DELIVERY_CHARGE: i64 = 49;

pub fn delivery_charge_for(subtotal: i64) -> i64 {
    if subtotal >= FREE_DELIVERY_THRESHOLD {
        0
    } else {
        DELIVERY_CHARGE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShippingAddress {
    #[sqlx(rename = "shipping_name")]
    pub name: String,
    #[sqlx(rename = "shipping_phone")]
    pub phone: String,
    #[sqlx(rename = "shipping_street")]
    pub street: String,
    #[sqlx(rename = "shipping_city")]
    pub city: String,
    #[sqlx(rename = "shipping_state")]
    pub state: String,
    #[sqlx(rename = "shipping_pincode")]
    pub pincode: String,
}

/// Price snapshot taken at placement. `stock_applied` records whether this
/// line's stock decrement is currently in effect.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub order_item_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    pub stock_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: i32,
    pub user_id: i32,
    pub tracking_id: String,
    #[sqlx(flatten)]
    pub shipping_address: ShippingAddress,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub order_status: OrderStatus,
    #[sqlx(try_from = "String")]
    pub placement_state: PlacementState,
    pub subtotal: i64,
    pub delivery_charge: i64,
    pub total_amount: i64,
    pub delivered_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn applied_items(&self) -> impl Iterator<Item = &OrderItem> {
        self.items.iter().filter(|item| item.stock_applied)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub total_revenue: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        orders.iter().fold(Self::default(), |mut stats, order| {
            stats.total_orders += 1;
            stats.total_revenue += order.total_amount;
            match order.order_status {
                OrderStatus::Placed => stats.pending_orders += 1,
                OrderStatus::Delivered => stats.delivered_orders += 1,
                _ => {}
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn delivery_boundary() {
        assert_eq!(delivery_charge_for(450), 49);
        assert_eq!(450 + delivery_charge_for(450), 499);
        assert_eq!(delivery_charge_for(499), 0);
        assert_eq!(delivery_charge_for(500), 0);
    }

    proptest! {
        #[test]
        fn delivery_is_free_only_above_threshold(subtotal in 0i64..100_000) {
            let charge = delivery_charge_for(subtotal);
            prop_assert_eq!(charge == 0, subtotal >= FREE_DELIVERY_THRESHOLD);
            prop_assert!(charge == 0 || charge == DELIVERY_CHARGE);
        }
    }
}
