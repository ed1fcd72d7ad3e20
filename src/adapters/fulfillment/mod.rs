//! Fulfillment hooks.

mod logging;

pub use logging::LoggingFulfillment;
