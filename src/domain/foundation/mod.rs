//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine trait and error
//! types that form the vocabulary of the payments domain.

mod currency;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use currency::Currency;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{IdempotencyKey, IntentId, MAX_IDEMPOTENCY_KEY_LEN};
pub use state_machine::{StateMachine, TransitionError};
pub use timestamp::Timestamp;
