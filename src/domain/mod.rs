//! Domain layer: entities, value objects and the ports they are stored and
//! exchanged through.

pub mod cart;
pub mod order;
pub mod payment;
pub mod ports;
pub mod user;
