use crate::domain::cart::CartItem;
use crate::domain::user::Role;
use crate::error::{Error, Result};
use crate::interfaces::gateway::wire::CallbackPayload;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};

/// One line of the replay stream, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Seeds a user record.
    User { username: String, role: Role },
    /// Seeds a cart with its items.
    Cart {
        id: i32,
        owner: String,
        items: Vec<CartItem>,
    },
    /// Initiates a payment for a cart.
    PaymentRequest {
        order_id: String,
        amount: i64,
        cart_id: i32,
        requested_by: String,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        payer_name: String,
        #[serde(default)]
        payer_phone: String,
        #[serde(default)]
        payer_email: String,
        #[serde(default)]
        callback_url: String,
    },
    /// A recorded gateway callback.
    Callback {
        #[serde(flatten)]
        payload: CallbackPayload,
    },
    /// Marks the order materialized from the given transaction as sent.
    ToggleSent {
        transaction_id: String,
        requested_by: String,
    },
}

/// Reads inbound events from a JSON-lines source.
///
/// Wraps any `Read` and yields one `Result<InboundEvent>` per non-empty
/// line, so large replay files stream without being loaded whole.
pub struct EventReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<InboundEvent>> {
        self.reader
            .lines()
            .map(|line| {
                line.map_err(|err| Error::ArgumentInvalid(format!("unreadable line: {err}")))
            })
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| {
                let line = line?;
                serde_json::from_str(&line)
                    .map_err(|err| Error::ArgumentInvalid(format!("malformed event: {err}")))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = concat!(
            r#"{"event":"user","username":"alice","role":"customer"}"#,
            "\n",
            r#"{"event":"payment_request","order_id":"X1","amount":50000,"cart_id":7,"requested_by":"alice"}"#,
            "\n",
        );
        let results: Vec<_> = EventReader::new(data.as_bytes()).events().collect();

        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].as_ref().unwrap(),
            InboundEvent::User { username, .. } if username == "alice"
        ));
        assert!(matches!(
            results[1].as_ref().unwrap(),
            InboundEvent::PaymentRequest { amount: 50_000, cart_id: 7, .. }
        ));
    }

    #[test]
    fn test_callback_event_uses_wire_field_names() {
        let data = r#"{"event":"callback","status":200,"track_id":1,"id":"T1","order_id":"X1","amount":50000,"card_no":"x","hashed_card_no":"y","date":1700000000}"#;
        let event = EventReader::new(data.as_bytes())
            .events()
            .next()
            .unwrap()
            .unwrap();
        match event {
            InboundEvent::Callback { payload } => {
                assert_eq!(payload.id, "T1");
                assert_eq!(payload.status, 200);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_malformed_line_yields_error_and_stream_continues() {
        let data = concat!(
            "{not json}\n",
            "\n",
            r#"{"event":"user","username":"bob","role":"admin"}"#,
            "\n",
        );
        let results: Vec<_> = EventReader::new(data.as_bytes()).events().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }
}
