//! The single table-driven translator from vendor (HTTP status, error code)
//! pairs to [`GatewayError`], shared by both outbound calls.

use crate::error::GatewayError;

/// Maps a non-success gateway response onto the failure taxonomy.
///
/// Codes 34/35 carry the violated bound inside `message` and code 13
/// carries the offending IPv4 address; both are extracted here so callers
/// never parse vendor text themselves.
pub fn translate(status: u16, code: i32, message: &str) -> GatewayError {
    match status {
        406 => match code {
            34 => GatewayError::AmountBelowMinimum {
                min: extract_amount(message),
            },
            35 => GatewayError::AmountAboveMaximum {
                max: extract_amount(message),
            },
            36 => GatewayError::AmountAboveLimit,
            38 => GatewayError::CallbackDomainMismatch,
            39 => GatewayError::InvalidCallbackAddress,
            _ => GatewayError::Unexpected {
                status,
                code: Some(code),
            },
        },
        403 => match code {
            11 => GatewayError::UserBlocked,
            12 => GatewayError::ApiKeyNotFound,
            13 => GatewayError::IpMismatch {
                ip: extract_ipv4(message),
            },
            14 => GatewayError::WebServiceNotApproved,
            21 => GatewayError::BankAccountNotApproved,
            24 => GatewayError::BankAccountInactive,
            _ => GatewayError::Unexpected {
                status,
                code: Some(code),
            },
        },
        405 => GatewayError::TransactionNotCreated,
        _ => GatewayError::Unexpected {
            status,
            code: Some(code),
        },
    }
}

/// First run of ASCII digits in the message, or 0 when none exists.
fn extract_amount(message: &str) -> i64 {
    message
        .split(|c: char| !c.is_ascii_digit())
        .filter(|chunk| !chunk.is_empty())
        .find_map(|chunk| chunk.parse().ok())
        .unwrap_or(0)
}

/// First token that parses as an IPv4 address, or "unknown".
fn extract_ipv4(message: &str) -> String {
    message
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .filter(|token| !token.is_empty())
        .find(|token| token.parse::<std::net::Ipv4Addr>().is_ok())
        .map(str::to_owned)
        .unwrap_or_else(|| "unknown".to_owned())
}
