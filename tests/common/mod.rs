use serde_json::{Value, json};
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_events(path: &Path, events: &[Value]) {
    let mut file = File::create(path).unwrap();
    for event in events {
        writeln!(file, "{event}").unwrap();
    }
}

/// An admin, a customer and cart #7 holding items from brands 10, 10, 20.
pub fn seed_events() -> Vec<Value> {
    vec![
        json!({"event": "user", "username": "root", "role": "admin"}),
        json!({"event": "user", "username": "alice", "role": "customer"}),
        json!({"event": "user", "username": "bob", "role": "customer"}),
        json!({"event": "cart", "id": 7, "owner": "alice", "items": [
            {"product_id": 1, "brand_id": 10, "count": 2},
            {"product_id": 2, "brand_id": 10, "count": 1},
            {"product_id": 3, "brand_id": 20, "count": 1}
        ]}),
    ]
}

pub fn payment_request(order_id: &str, amount: i64, cart_id: i32, requested_by: &str) -> Value {
    json!({
        "event": "payment_request",
        "order_id": order_id,
        "amount": amount,
        "cart_id": cart_id,
        "requested_by": requested_by,
        "payer_name": "Alice",
        "payer_phone": "0912",
        "payer_email": "alice@example.com",
        "callback_url": "https://shop.example.com/callback"
    })
}

pub fn callback(status: i32, transaction_id: &str, order_id: &str, amount: i64, date: i64) -> Value {
    json!({
        "event": "callback",
        "status": status,
        "track_id": 1,
        "id": transaction_id,
        "order_id": order_id,
        "amount": amount,
        "card_no": "6037-xxxx",
        "hashed_card_no": "abcd",
        "date": date
    })
}

pub fn toggle_sent(transaction_id: &str, requested_by: &str) -> Value {
    json!({
        "event": "toggle_sent",
        "transaction_id": transaction_id,
        "requested_by": requested_by
    })
}
