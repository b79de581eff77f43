use crate::domain::cart::ShoppingCart;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Preparing,
    Sent,
}

/// A durable order, materialized exactly once when its payment is verified
/// successful. Owns one payment and one cart; never deleted by this
/// subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub date_issued: DateTime<Utc>,
    pub status: OrderStatus,
    pub transaction_id: String,
    pub cart_id: i32,
}

impl Order {
    /// Builds a fresh order in `Preparing`, dated at the payment's
    /// verification time.
    pub fn place(transaction_id: String, cart_id: i32, date_issued: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date_issued,
            status: OrderStatus::Preparing,
            transaction_id,
            cart_id,
        }
    }

    /// One-way `Preparing -> Sent` transition. Returns `false` when the
    /// order was already sent, which callers treat as a no-op.
    pub fn mark_sent(&mut self) -> bool {
        if self.status == OrderStatus::Sent {
            return false;
        }
        self.status = OrderStatus::Sent;
        true
    }
}

/// Join entity linking a brand to an order: one row per distinct brand in
/// the paid cart. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandOrder {
    pub brand_id: i32,
    pub order_id: Uuid,
}

/// Derives the brand fan-out for a paid cart: one `BrandOrder` per distinct
/// brand, in ascending brand order.
pub fn brand_fan_out(order_id: Uuid, cart: &ShoppingCart) -> Vec<BrandOrder> {
    cart.distinct_brands()
        .into_iter()
        .map(|brand_id| BrandOrder { brand_id, order_id })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartItem;

    #[test]
    fn test_placed_order_is_preparing() {
        let at = Utc::now();
        let order = Order::place("T1".into(), 7, at);
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.date_issued, at);
    }

    #[test]
    fn test_mark_sent_is_one_way() {
        let mut order = Order::place("T1".into(), 7, Utc::now());
        assert!(order.mark_sent());
        assert_eq!(order.status, OrderStatus::Sent);
        assert!(!order.mark_sent());
        assert_eq!(order.status, OrderStatus::Sent);
    }

    #[test]
    fn test_brand_fan_out_one_row_per_distinct_brand() {
        let cart = ShoppingCart {
            id: 7,
            owner: "alice".into(),
            items: vec![
                CartItem {
                    product_id: 1,
                    brand_id: 10,
                    count: 2,
                },
                CartItem {
                    product_id: 2,
                    brand_id: 10,
                    count: 1,
                },
                CartItem {
                    product_id: 3,
                    brand_id: 20,
                    count: 1,
                },
            ],
        };
        let order_id = Uuid::new_v4();
        let fan_out = brand_fan_out(order_id, &cart);
        assert_eq!(fan_out.len(), 2);
        assert_eq!(fan_out[0].brand_id, 10);
        assert_eq!(fan_out[1].brand_id, 20);
        assert!(fan_out.iter().all(|bo| bo.order_id == order_id));
    }
}
