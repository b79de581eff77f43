use crate::application::authorization::AuthorizationGate;
use crate::application::events::{DomainEvent, EventDispatcher};
use crate::domain::order::{Order, brand_fan_out};
use crate::domain::payment::{Amount, Payment};
use crate::domain::ports::{
    CartStoreBox, ClaimOutcome, OrderStoreBox, PaymentGatewayBox, PaymentRequest, PaymentStoreBox,
};
use crate::error::{Error, Result};
use crate::interfaces::gateway::wire::{CallbackPayload, status_indicates_paid};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Input to [`PaymentService::send_payment_request`].
#[derive(Debug, Clone)]
pub struct SendPaymentRequest {
    /// Caller-generated correlation id for the gateway transaction.
    pub order_id: String,
    /// Smallest currency unit; must be positive.
    pub amount: i64,
    pub description: Option<String>,
    pub cart_id: i32,
    pub requested_by: String,
    pub payer_name: String,
    pub payer_phone: String,
    pub payer_email: String,
    pub callback_url: String,
}

/// Root orchestrator of the payment lifecycle: gateway calls, callback
/// validation with server-side re-verification, and atomic order
/// materialization with per-brand fan-out.
pub struct PaymentService {
    gate: AuthorizationGate,
    gateway: PaymentGatewayBox,
    payments: PaymentStoreBox,
    carts: CartStoreBox,
    orders: OrderStoreBox,
    events: Arc<EventDispatcher>,
    gateway_timeout: Duration,
}

impl PaymentService {
    pub fn new(
        gate: AuthorizationGate,
        gateway: PaymentGatewayBox,
        payments: PaymentStoreBox,
        carts: CartStoreBox,
        orders: OrderStoreBox,
        events: Arc<EventDispatcher>,
        gateway_timeout: Duration,
    ) -> Self {
        Self {
            gate,
            gateway,
            payments,
            carts,
            orders,
            events,
            gateway_timeout,
        }
    }

    /// Bounds a gateway call; on expiry no payment state has changed and
    /// the caller sees a transient signal instead of a vendor error.
    async fn bounded<F, T>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.gateway_timeout, call)
            .await
            .map_err(|_| Error::GatewayTimeout)?
    }

    /// Initiates a payment with the gateway and returns the redirect link.
    ///
    /// The payment row is persisted only after the gateway accepts the
    /// transaction; a failed creation propagates the typed error untouched
    /// and leaves nothing behind. A transaction id already present in the
    /// ledger is rejected rather than overwritten, keeping ids unique and
    /// immutable.
    pub async fn send_payment_request(&self, request: SendPaymentRequest) -> Result<String> {
        let amount = Amount::new(request.amount)?;
        let cart = self
            .carts
            .get(request.cart_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("cart {}", request.cart_id)))?;
        self.gate.authorize(&request.requested_by, &cart.owner).await?;

        let gateway_request = PaymentRequest {
            order_id: request.order_id.clone(),
            amount,
            payer_name: request.payer_name,
            payer_phone: request.payer_phone,
            payer_email: request.payer_email,
            description: request.description.unwrap_or_default(),
            callback_url: request.callback_url,
        };
        let created = self
            .bounded(self.gateway.create_transaction(&gateway_request))
            .await?;

        let payment = Payment::new(
            created.transaction_id.clone(),
            request.order_id,
            amount,
            created.link.clone(),
            Some(request.cart_id),
            Utc::now(),
        );
        self.payments.insert_new(payment).await?;

        tracing::info!(
            transaction_id = %created.transaction_id,
            cart_id = request.cart_id,
            amount = amount.value(),
            "payment request sent"
        );
        Ok(created.link)
    }

    /// Validates a gateway callback and, on confirmed success, atomically
    /// materializes the order with its brand fan-out.
    ///
    /// Two-tier verification: the callback status is mapped through the
    /// fixed table first, then the outcome is re-verified server-side
    /// before it is trusted. Duplicate deliveries settle as no-ops
    /// reporting the recorded outcome.
    pub async fn payment_outcome_validation(&self, callback: &CallbackPayload) -> Result<bool> {
        let payment = self
            .payments
            .get(&callback.id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("payment {}", callback.id)))?;

        match self.payments.claim_verification(&callback.id).await? {
            ClaimOutcome::Claimed => {}
            ClaimOutcome::AlreadySettled { successful } => {
                tracing::debug!(transaction_id = %callback.id, "duplicate callback ignored");
                return Ok(successful);
            }
            ClaimOutcome::InFlight => {
                return Err(Error::ArgumentInvalid(format!(
                    "verification of transaction {} is already in progress",
                    callback.id
                )));
            }
        }

        match self.verify_claimed(payment, callback).await {
            Ok(successful) => Ok(successful),
            Err(err) => {
                // Give a later delivery another chance; the claim must not
                // leak on a failed attempt.
                self.payments.release_claim(&callback.id).await?;
                Err(err)
            }
        }
    }

    async fn verify_claimed(&self, payment: Payment, callback: &CallbackPayload) -> Result<bool> {
        let successful = status_indicates_paid(callback.status).ok_or_else(|| {
            Error::ArgumentInvalid(format!("unknown callback status {}", callback.status))
        })?;
        let verified_at = DateTime::from_timestamp(callback.date, 0).ok_or_else(|| {
            Error::ArgumentInvalid(format!("invalid callback date {}", callback.date))
        })?;

        if callback.amount != payment.amount.value() {
            tracing::warn!(
                transaction_id = %callback.id,
                callback_amount = callback.amount,
                payment_amount = payment.amount.value(),
                "callback amount differs from the recorded payment"
            );
        }

        if !successful {
            let mut settled = payment;
            settled.settle(false, verified_at);
            self.payments.store(settled).await?;
            self.events.dispatch(&DomainEvent::PaymentRejected {
                transaction_id: callback.id.clone(),
            })?;
            tracing::info!(transaction_id = %callback.id, status = callback.status, "payment rejected");
            return Ok(false);
        }

        // Callbacks can be forged; only the gateway's own answer is trusted.
        self.bounded(
            self.gateway
                .verify_transaction(&callback.id, &callback.order_id),
        )
        .await?;

        let cart_id = payment
            .cart_id
            .ok_or_else(|| Error::NotFound(format!("cart for payment {}", callback.id)))?;
        let cart = self
            .carts
            .get(cart_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("cart {cart_id}")))?;

        let mut settled = payment;
        settled.settle(true, verified_at);
        let order = Order::place(callback.id.clone(), cart_id, verified_at);
        let brand_orders = brand_fan_out(order.id, &cart);
        let brand_ids: Vec<i32> = brand_orders.iter().map(|bo| bo.brand_id).collect();
        let order_id = order.id;

        self.orders
            .commit_confirmed(settled, order, brand_orders)
            .await?;

        self.events.dispatch(&DomainEvent::PaymentConfirmed {
            transaction_id: callback.id.clone(),
            order_id,
        })?;
        self.events.dispatch(&DomainEvent::OrderPlaced {
            order_id,
            brand_ids,
        })?;
        tracing::info!(transaction_id = %callback.id, %order_id, "order materialized");
        Ok(true)
    }

    /// Admin-only `Preparing -> Sent` transition. Re-toggling an
    /// already-sent order is a no-op success.
    pub async fn toggle_order_to_sent(&self, order_id: Uuid, requested_by: &str) -> Result<Order> {
        self.gate.require_admin(requested_by).await?;
        let (order, transitioned) = self.orders.mark_sent(order_id).await?;
        if transitioned {
            self.events.dispatch(&DomainEvent::OrderSent { order_id })?;
            tracing::info!(%order_id, by = requested_by, "order marked sent");
        }
        Ok(order)
    }

    /// All payments; `EmptyResult` when none exist.
    pub async fn get_payments(&self) -> Result<Vec<Payment>> {
        let payments = self.payments.get_all().await?;
        if payments.is_empty() {
            Err(Error::EmptyResult)
        } else {
            Ok(payments)
        }
    }

    pub async fn get_payment(&self, transaction_id: &str) -> Result<Payment> {
        self.payments
            .get(transaction_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("payment {transaction_id}")))
    }
}
