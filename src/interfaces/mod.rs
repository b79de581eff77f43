//! Adapters between the application core and the outside world: the payment
//! gateway protocol, the replay event stream and the CSV report.

pub mod csv;
pub mod events;
pub mod gateway;
