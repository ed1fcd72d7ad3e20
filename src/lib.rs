//! Storefront Payments - payment orchestration for a storefront
//!
//! Routes checkouts to card, wallet, crypto, regional and bank transfer
//! providers behind idempotent payment intents, verifies provider webhooks,
//! and converts prices between currencies.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod startup;
