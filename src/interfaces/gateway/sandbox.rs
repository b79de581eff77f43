use crate::domain::ports::{CreatedTransaction, PaymentGateway, PaymentRequest};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

/// In-process gateway stand-in for offline replay runs and end-to-end
/// tests. Assigns deterministic `SBX-n` transaction ids and confirms every
/// verification at the current time.
#[derive(Default)]
pub struct SandboxGateway {
    next_id: Mutex<u64>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_transaction(&self, request: &PaymentRequest) -> Result<CreatedTransaction> {
        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let transaction_id = format!("SBX-{next_id}");
        tracing::debug!(
            %transaction_id,
            order_id = %request.order_id,
            amount = request.amount.value(),
            "sandbox transaction created"
        );
        Ok(CreatedTransaction {
            link: format!("https://gateway.sandbox/pay/{transaction_id}"),
            transaction_id,
        })
    }

    async fn verify_transaction(&self, _transaction_id: &str, _order_id: &str) -> Result<i64> {
        Ok(Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;

    fn request(order_id: &str) -> PaymentRequest {
        PaymentRequest {
            order_id: order_id.into(),
            amount: Amount::new(1_000).unwrap(),
            payer_name: String::new(),
            payer_phone: String::new(),
            payer_email: String::new(),
            description: String::new(),
            callback_url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let gateway = SandboxGateway::new();
        let first = gateway.create_transaction(&request("X1")).await.unwrap();
        let second = gateway.create_transaction(&request("X2")).await.unwrap();
        assert_eq!(first.transaction_id, "SBX-1");
        assert_eq!(second.transaction_id, "SBX-2");
        assert_eq!(first.link, "https://gateway.sandbox/pay/SBX-1");
    }
}
