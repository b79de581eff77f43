use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A product reference inside a cart. `brand_id` drives the per-brand
/// fan-out when the cart is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i32,
    pub brand_id: i32,
    /// Positive item count.
    pub count: u32,
}

/// A shopping cart owned by exactly one user. Has at most one resulting
/// order once its payment is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingCart {
    pub id: i32,
    pub owner: String,
    pub items: Vec<CartItem>,
}

impl ShoppingCart {
    /// The distinct brands represented in this cart, order-independent.
    /// Each brand appears once no matter how many items reference it.
    pub fn distinct_brands(&self) -> BTreeSet<i32> {
        self.items.iter().map(|item| item.brand_id).collect()
    }
}
