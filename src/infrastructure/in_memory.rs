use crate::domain::cart::ShoppingCart;
use crate::domain::order::{BrandOrder, Order};
use crate::domain::payment::{Payment, VerificationState};
use crate::domain::ports::{CartStore, ClaimOutcome, OrderStore, PaymentStore, UserStore};
use crate::domain::user::User;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    carts: HashMap<i32, ShoppingCart>,
    payments: HashMap<String, Payment>,
    orders: HashMap<Uuid, Order>,
    brand_orders: Vec<BrandOrder>,
}

/// Thread-safe in-memory record store implementing every store port.
///
/// One struct holds all entity maps behind a single `RwLock` so that the
/// confirmed-order commit and the verification claim are genuinely atomic:
/// readers either see the whole commit or none of it. `Clone` shares the
/// underlying state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user directly, bypassing the ports. For composition roots
    /// and tests.
    pub async fn seed_user(&self, user: User) {
        self.state
            .write()
            .await
            .users
            .insert(user.username.clone(), user);
    }

    /// Seeds a cart directly, bypassing the ports.
    pub async fn seed_cart(&self, cart: ShoppingCart) {
        self.state.write().await.carts.insert(cart.id, cart);
    }

    /// Snapshot of all orders, for reports and assertions.
    pub async fn all_orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.state.read().await.orders.values().cloned().collect();
        orders.sort_by_key(|order| order.date_issued);
        orders
    }

    /// Snapshot of the brand fan-out of one order.
    pub async fn brand_orders_for(&self, order_id: Uuid) -> Vec<BrandOrder> {
        let mut rows: Vec<BrandOrder> = self
            .state
            .read()
            .await
            .brand_orders
            .iter()
            .filter(|bo| bo.order_id == order_id)
            .cloned()
            .collect();
        rows.sort_by_key(|bo| bo.brand_id);
        rows
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn store(&self, user: User) -> Result<()> {
        self.state
            .write()
            .await
            .users
            .insert(user.username.clone(), user);
        Ok(())
    }

    async fn get(&self, username: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(username).cloned())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn store(&self, cart: ShoppingCart) -> Result<()> {
        self.state.write().await.carts.insert(cart.id, cart);
        Ok(())
    }

    async fn get(&self, cart_id: i32) -> Result<Option<ShoppingCart>> {
        Ok(self.state.read().await.carts.get(&cart_id).cloned())
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn insert_new(&self, payment: Payment) -> Result<()> {
        let mut state = self.state.write().await;
        if state.payments.contains_key(&payment.transaction_id) {
            return Err(Error::ArgumentInvalid(format!(
                "transaction {} already recorded",
                payment.transaction_id
            )));
        }
        state
            .payments
            .insert(payment.transaction_id.clone(), payment);
        Ok(())
    }

    async fn store(&self, payment: Payment) -> Result<()> {
        self.state
            .write()
            .await
            .payments
            .insert(payment.transaction_id.clone(), payment);
        Ok(())
    }

    async fn get(&self, transaction_id: &str) -> Result<Option<Payment>> {
        Ok(self
            .state
            .read()
            .await
            .payments
            .get(transaction_id)
            .cloned())
    }

    async fn get_all(&self) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> =
            self.state.read().await.payments.values().cloned().collect();
        payments.sort_by_key(|payment| payment.date_issued);
        Ok(payments)
    }

    async fn claim_verification(&self, transaction_id: &str) -> Result<ClaimOutcome> {
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .get_mut(transaction_id)
            .ok_or_else(|| Error::NotFound(format!("payment {transaction_id}")))?;

        Ok(match payment.verification {
            VerificationState::Pending => {
                payment.verification = VerificationState::InFlight;
                ClaimOutcome::Claimed
            }
            VerificationState::InFlight => ClaimOutcome::InFlight,
            VerificationState::Settled => ClaimOutcome::AlreadySettled {
                successful: payment.successful.unwrap_or(false),
            },
        })
    }

    async fn release_claim(&self, transaction_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .get_mut(transaction_id)
            .ok_or_else(|| Error::NotFound(format!("payment {transaction_id}")))?;
        if payment.verification == VerificationState::InFlight {
            payment.verification = VerificationState::Pending;
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Order>> {
        Ok(self.all_orders().await)
    }

    async fn brand_orders(&self, order_id: Uuid) -> Result<Vec<BrandOrder>> {
        Ok(self.brand_orders_for(order_id).await)
    }

    async fn commit_confirmed(
        &self,
        payment: Payment,
        order: Order,
        brand_orders: Vec<BrandOrder>,
    ) -> Result<()> {
        // One write guard spans all three mutations; nothing partial is
        // ever observable.
        let mut state = self.state.write().await;
        state
            .payments
            .insert(payment.transaction_id.clone(), payment);
        state.orders.insert(order.id, order);
        state.brand_orders.extend(brand_orders);
        Ok(())
    }

    async fn mark_sent(&self, order_id: Uuid) -> Result<(Order, bool)> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| Error::NotFound(format!("order {order_id}")))?;
        let transitioned = order.mark_sent();
        Ok((order.clone(), transitioned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;
    use chrono::Utc;

    fn payment(transaction_id: &str) -> Payment {
        Payment::new(
            transaction_id.into(),
            "X1".into(),
            Amount::new(1_000).unwrap(),
            "https://pay/T1".into(),
            Some(7),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_store_and_retrieve_payment() {
        let store = InMemoryStore::new();
        PaymentStore::store(&store, payment("T1")).await.unwrap();

        let found = PaymentStore::get(&store, "T1").await.unwrap();
        assert_eq!(found.unwrap().transaction_id, "T1");
        assert!(PaymentStore::get(&store, "T9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_new_rejects_duplicate_transaction_id() {
        let store = InMemoryStore::new();
        store.insert_new(payment("T1")).await.unwrap();

        let mut settled = payment("T1");
        settled.settle(true, Utc::now());
        PaymentStore::store(&store, settled).await.unwrap();

        let dup = store.insert_new(payment("T1")).await;
        assert!(matches!(dup, Err(Error::ArgumentInvalid(_))));

        // The settled row is untouched.
        let found = PaymentStore::get(&store, "T1").await.unwrap().unwrap();
        assert_eq!(found.successful, Some(true));
    }

    #[tokio::test]
    async fn test_claim_is_won_exactly_once() {
        let store = InMemoryStore::new();
        PaymentStore::store(&store, payment("T1")).await.unwrap();

        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::Claimed
        );
        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::InFlight
        );
    }

    #[tokio::test]
    async fn test_release_returns_claim_to_pending() {
        let store = InMemoryStore::new();
        PaymentStore::store(&store, payment("T1")).await.unwrap();

        store.claim_verification("T1").await.unwrap();
        store.release_claim("T1").await.unwrap();
        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::Claimed
        );
    }

    #[tokio::test]
    async fn test_settled_payment_reports_its_outcome() {
        let store = InMemoryStore::new();
        let mut p = payment("T1");
        p.settle(true, Utc::now());
        PaymentStore::store(&store, p).await.unwrap();

        assert_eq!(
            store.claim_verification("T1").await.unwrap(),
            ClaimOutcome::AlreadySettled { successful: true }
        );
    }

    #[tokio::test]
    async fn test_claim_for_unknown_payment_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.claim_verification("T404").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_confirmed_lands_everything_together() {
        let store = InMemoryStore::new();
        let mut p = payment("T1");
        p.settle(true, Utc::now());
        let order = Order::place("T1".into(), 7, Utc::now());
        let order_id = order.id;
        let fan_out = vec![
            BrandOrder {
                brand_id: 10,
                order_id,
            },
            BrandOrder {
                brand_id: 20,
                order_id,
            },
        ];

        store.commit_confirmed(p, order, fan_out).await.unwrap();

        assert!(OrderStore::get(&store, order_id).await.unwrap().is_some());
        assert_eq!(store.brand_orders_for(order_id).await.len(), 2);
        let stored = PaymentStore::get(&store, "T1").await.unwrap().unwrap();
        assert_eq!(stored.successful, Some(true));
    }

    #[tokio::test]
    async fn test_mark_sent_unknown_order() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.mark_sent(Uuid::new_v4()).await,
            Err(Error::NotFound(_))
        ));
    }
}
