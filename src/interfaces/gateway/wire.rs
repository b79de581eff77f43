//! Typed renderings of the gateway wire contract. Field names are the wire
//! contract and must not change.

use serde::{Deserialize, Serialize};

/// Body of `POST /payment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTransactionRequest {
    pub order_id: String,
    pub amount: i64,
    pub name: String,
    pub phone: String,
    pub mail: String,
    pub desc: String,
    pub callback: String,
}

/// `201 Created` body of `POST /payment`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTransactionResponse {
    pub id: String,
    pub link: String,
}

/// Body of `POST /payment/verify`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyTransactionRequest {
    pub id: String,
    pub order_id: String,
}

/// Success body of `POST /payment/verify`. The gateway returns additional
/// keys; only `verify` (unix seconds as a string) is contractual.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerifyTransactionResponse {
    pub verify: String,
}

/// Non-success body of either endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayErrorBody {
    pub code: i32,
    pub message: String,
}

/// Gateway-initiated notification of a transaction outcome. Never trusted
/// on its own; the service re-verifies server-side before materializing an
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub status: i32,
    pub track_id: i64,
    /// The gateway transaction id.
    pub id: String,
    pub order_id: String,
    pub amount: i64,
    pub card_no: String,
    pub hashed_card_no: String,
    /// Transaction time in unix seconds.
    pub date: i64,
}

/// Fixed callback-status table. `None` means the code is outside the
/// contract and the callback is malformed.
pub fn status_indicates_paid(status: i32) -> Option<bool> {
    match status {
        1..=8 | 10 => Some(false),
        100 | 101 | 200 => Some(true),
        _ => None,
    }
}
