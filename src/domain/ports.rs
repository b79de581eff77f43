use crate::domain::cart::ShoppingCart;
use crate::domain::order::{BrandOrder, Order};
use crate::domain::payment::{Amount, Payment};
use crate::domain::user::User;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub type UserStoreBox = Box<dyn UserStore>;
pub type CartStoreBox = Box<dyn CartStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store(&self, user: User) -> Result<()>;
    async fn get(&self, username: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn store(&self, cart: ShoppingCart) -> Result<()>;
    async fn get(&self, cart_id: i32) -> Result<Option<ShoppingCart>>;
}

/// Result of attempting to claim verification of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller won the claim and must settle or release it.
    Claimed,
    /// A previous delivery already settled this payment with the given
    /// outcome.
    AlreadySettled { successful: bool },
    /// Another delivery holds the claim right now.
    InFlight,
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a brand-new payment. Transaction ids are unique and never
    /// reassigned, so a colliding id fails with `ArgumentInvalid` instead
    /// of overwriting the existing row.
    async fn insert_new(&self, payment: Payment) -> Result<()>;

    /// Overwrites an existing payment, for settling an outcome.
    async fn store(&self, payment: Payment) -> Result<()>;
    async fn get(&self, transaction_id: &str) -> Result<Option<Payment>>;
    async fn get_all(&self) -> Result<Vec<Payment>>;

    /// Atomically claims the right to verify `transaction_id`
    /// (`Pending -> InFlight`). Concurrent and duplicate callback
    /// deliveries lose this race, which is what keeps order
    /// materialization at-most-once.
    async fn claim_verification(&self, transaction_id: &str) -> Result<ClaimOutcome>;

    /// Returns a claimed payment to `Pending` so a later callback can retry
    /// after a failed verification attempt.
    async fn release_claim(&self, transaction_id: &str) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>>;
    async fn get_all(&self) -> Result<Vec<Order>>;
    async fn brand_orders(&self, order_id: Uuid) -> Result<Vec<BrandOrder>>;

    /// Persists the settled payment, the new order and its brand fan-out in
    /// a single atomic commit. Either everything lands or nothing does.
    async fn commit_confirmed(
        &self,
        payment: Payment,
        order: Order,
        brand_orders: Vec<BrandOrder>,
    ) -> Result<()>;

    /// `Preparing -> Sent`. Fails with `NotFound` for an unknown order;
    /// returns `(order, false)` unchanged when it was already sent.
    async fn mark_sent(&self, order_id: Uuid) -> Result<(Order, bool)>;
}

/// Everything the gateway needs to open a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub order_id: String,
    pub amount: Amount,
    pub payer_name: String,
    pub payer_phone: String,
    pub payer_email: String,
    pub description: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTransaction {
    pub transaction_id: String,
    pub link: String,
}

/// Outbound port to the payment provider. Both calls are stateless, carry
/// no automatic retry, and surface typed errors to the caller.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(&self, request: &PaymentRequest) -> Result<CreatedTransaction>;

    /// Server-side double-confirmation of a callback. Returns the gateway's
    /// verification time in unix seconds.
    async fn verify_transaction(&self, transaction_id: &str, order_id: &str) -> Result<i64>;
}
