//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors, state machine)
//! - `payment` - Payment intents, their lifecycle, and provider routing
//! - `webhook` - Provider callback verification and interpretation
//! - `currency` - Exchange rates and price conversion

pub mod currency;
pub mod foundation;
pub mod payment;
pub mod webhook;
