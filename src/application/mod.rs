//! Application layer containing the core business logic orchestration.
//!
//! `PaymentService` is the root orchestrator for the payment lifecycle; the
//! `AuthorizationGate` fronts every state-mutating operation and the
//! `EventDispatcher` decouples state-change side effects from the components
//! that cause them.

pub mod authorization;
pub mod events;
pub mod service;
