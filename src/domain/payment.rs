use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A positive monetary amount in the smallest currency unit.
///
/// Wraps `i64` to enforce positivity at construction time; no fractional
/// arithmetic exists in this domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn new(value: i64) -> Result<Self, Error> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(Error::ArgumentInvalid(format!(
                "amount must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// At-most-once claim on callback verification for a payment.
///
/// Duplicate or concurrent callback deliveries race on the `Pending ->
/// InFlight` transition; only the winner talks to the gateway and
/// materializes an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationState {
    #[default]
    Pending,
    InFlight,
    Settled,
}

/// A single payment attempt tracked against the gateway.
///
/// Created only after the gateway accepts the transaction (so a failed
/// creation leaves no row behind) and mutated exactly once more, when the
/// verification outcome settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Gateway-assigned identity. Unique and immutable once assigned.
    pub transaction_id: String,
    /// Caller-generated correlation id linking the gateway transaction back
    /// to the storefront before the gateway's own id is known.
    pub order_id: String,
    pub amount: Amount,
    /// Redirect URL the payer is sent to.
    pub link: String,
    pub date_issued: DateTime<Utc>,
    /// Set at most once, null -> value, and only on confirmed success.
    pub date_verified_paid: Option<DateTime<Utc>>,
    /// Tri-state: unknown until the callback settles.
    pub successful: Option<bool>,
    /// Owning cart; nullable after detach.
    pub cart_id: Option<i32>,
    pub verification: VerificationState,
}

impl Payment {
    pub fn new(
        transaction_id: String,
        order_id: String,
        amount: Amount,
        link: String,
        cart_id: Option<i32>,
        date_issued: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id,
            order_id,
            amount,
            link,
            date_issued,
            date_verified_paid: None,
            successful: None,
            cart_id,
            verification: VerificationState::Pending,
        }
    }

    /// Records the verification outcome. `date_verified_paid` only
    /// transitions null -> value, and only for a confirmed success.
    pub fn settle(&mut self, successful: bool, verified_at: DateTime<Utc>) {
        self.successful = Some(successful);
        if successful && self.date_verified_paid.is_none() {
            self.date_verified_paid = Some(verified_at);
        }
        self.verification = VerificationState::Settled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment() -> Payment {
        Payment::new(
            "T1".into(),
            "X1".into(),
            Amount::new(50_000).unwrap(),
            "https://pay/T1".into(),
            Some(7),
            Utc::now(),
        )
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(1).is_ok());
        assert!(matches!(Amount::new(0), Err(Error::ArgumentInvalid(_))));
        assert!(matches!(Amount::new(-500), Err(Error::ArgumentInvalid(_))));
    }

    #[test]
    fn test_new_payment_is_unverified() {
        let p = payment();
        assert_eq!(p.successful, None);
        assert_eq!(p.date_verified_paid, None);
        assert_eq!(p.verification, VerificationState::Pending);
    }

    #[test]
    fn test_settle_success_stamps_verification_date() {
        let mut p = payment();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        p.settle(true, at);
        assert_eq!(p.successful, Some(true));
        assert_eq!(p.date_verified_paid, Some(at));
        assert_eq!(p.verification, VerificationState::Settled);
    }

    #[test]
    fn test_settle_failure_leaves_date_unset() {
        let mut p = payment();
        p.settle(false, Utc::now());
        assert_eq!(p.successful, Some(false));
        assert_eq!(p.date_verified_paid, None);
    }

    #[test]
    fn test_verification_date_set_at_most_once() {
        let mut p = payment();
        let first = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let second = DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        p.settle(true, first);
        p.settle(true, second);
        assert_eq!(p.date_verified_paid, Some(first));
    }
}
