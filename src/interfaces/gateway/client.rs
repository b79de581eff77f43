use crate::domain::ports::{CreatedTransaction, PaymentGateway, PaymentRequest};
use crate::error::{Error, GatewayError, Result};
use crate::interfaces::gateway::translate::translate;
use crate::interfaces::gateway::wire::{
    CreateTransactionRequest, CreateTransactionResponse, GatewayErrorBody,
    VerifyTransactionRequest, VerifyTransactionResponse,
};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    /// Sends `X-SANDBOX: 1` so the provider runs the transaction in its
    /// test environment.
    pub sandbox: bool,
    pub timeout: Duration,
}

/// HTTPS adapter for the provider protocol.
///
/// Stateless; every failure surfaces typed through the translator and
/// nothing is retried here. Retry policy belongs to the caller.
pub struct HttpGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(Error::Transport)?;
        Ok(Self { http, config })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .post(format!("{}{}", self.config.base_url, path))
            .header("X-API-Key", &self.config.api_key);
        if self.config.sandbox {
            builder.header("X-SANDBOX", "1")
        } else {
            builder
        }
    }

    async fn error_from(response: Response) -> Error {
        let status = response.status().as_u16();
        match response.json::<GatewayErrorBody>().await {
            Ok(body) => Error::Gateway(translate(status, body.code, &body.message)),
            // Unparseable error body: still a vendor failure, just untyped.
            Err(_) => Error::Gateway(GatewayError::Unexpected { status, code: None }),
        }
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::GatewayTimeout
    } else {
        Error::Transport(err)
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn create_transaction(&self, request: &PaymentRequest) -> Result<CreatedTransaction> {
        let body = CreateTransactionRequest {
            order_id: request.order_id.clone(),
            amount: request.amount.value(),
            name: request.payer_name.clone(),
            phone: request.payer_phone.clone(),
            mail: request.payer_email.clone(),
            desc: request.description.clone(),
            callback: request.callback_url.clone(),
        };

        let response = self
            .post("/payment")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::CREATED {
            let body: CreateTransactionResponse =
                response.json().await.map_err(transport_error)?;
            tracing::debug!(
                transaction_id = %body.id,
                order_id = %request.order_id,
                "gateway transaction created"
            );
            Ok(CreatedTransaction {
                transaction_id: body.id,
                link: body.link,
            })
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn verify_transaction(&self, transaction_id: &str, order_id: &str) -> Result<i64> {
        let body = VerifyTransactionRequest {
            id: transaction_id.to_owned(),
            order_id: order_id.to_owned(),
        };

        let response = self
            .post("/payment/verify")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            let body: VerifyTransactionResponse =
                response.json().await.map_err(transport_error)?;
            body.verify.parse::<i64>().map_err(|_| {
                Error::ArgumentInvalid(format!(
                    "gateway returned a non-numeric verify value: {:?}",
                    body.verify
                ))
            })
        } else {
            Err(Self::error_from(response).await)
        }
    }
}
