use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the payment subsystem.
///
/// The gateway client and the error translator never swallow errors; every
/// failure reaches the service caller typed. The transport boundary (outside
/// this crate) is responsible for mapping variants onto wire responses.
#[derive(Error, Debug)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    #[error("no records available")]
    EmptyResult,
    #[error("invalid argument: {0}")]
    ArgumentInvalid(String),
    #[error("gateway rejected the request: {0}")]
    Gateway(#[from] GatewayError),
    /// Transient signal, distinct from the vendor taxonomy. No payment state
    /// changes when a gateway call times out.
    #[error("gateway call timed out")]
    GatewayTimeout,
    #[error("gateway transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("store failure: {0}")]
    Store(String),
}

/// Typed rendering of the vendor's (HTTP status, error code) pairs.
///
/// Produced exclusively by [`crate::interfaces::gateway::translate`], which is
/// the single table shared by both outbound calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("amount is below the gateway minimum of {min}")]
    AmountBelowMinimum { min: i64 },
    #[error("amount is above the gateway maximum of {max}")]
    AmountAboveMaximum { max: i64 },
    #[error("amount exceeds the gateway transaction limit")]
    AmountAboveLimit,
    #[error("callback URL domain does not match the registered domain")]
    CallbackDomainMismatch,
    #[error("callback URL is not a valid address")]
    InvalidCallbackAddress,
    #[error("gateway user is blocked")]
    UserBlocked,
    #[error("API key not found")]
    ApiKeyNotFound,
    #[error("request sent from unregistered IP address {ip}")]
    IpMismatch { ip: String },
    #[error("web service has not been approved")]
    WebServiceNotApproved,
    #[error("bank account has not been approved")]
    BankAccountNotApproved,
    #[error("bank account is inactive")]
    BankAccountInactive,
    #[error("transaction was not created")]
    TransactionNotCreated,
    #[error("unexpected gateway error (status {status}, code {code:?})")]
    Unexpected { status: u16, code: Option<i32> },
}
