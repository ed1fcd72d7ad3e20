//! Payment intent status state machine.
//!
//! Statuses only move forward: `created → pending → {succeeded, failed}`.
//! A `created` intent may also jump straight to a terminal outcome when the
//! provider answers synchronously, or to `expired` once its TTL lapses.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Persisted, provider not yet (successfully) called.
    Created,

    /// Provider accepted the payment; outcome arrives asynchronously.
    Pending,

    /// Provider confirmed the charge.
    Succeeded,

    /// Provider rejected the charge or the create call failed.
    Failed,

    /// Stayed `created` past the intent TTL.
    Expired,
}

impl IntentStatus {
    pub const ALL: [IntentStatus; 5] = [
        IntentStatus::Created,
        IntentStatus::Pending,
        IntentStatus::Succeeded,
        IntentStatus::Failed,
        IntentStatus::Expired,
    ];

    /// Stable lower-case name used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Created => "created",
            IntentStatus::Pending => "pending",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Failed => "failed",
            IntentStatus::Expired => "expired",
        }
    }
}

impl StateMachine for IntentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use IntentStatus::*;
        matches!(
            (self, target),
            (Created, Pending)
                | (Created, Succeeded)
                | (Created, Failed)
                | (Created, Expired)
                | (Pending, Succeeded)
                | (Pending, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use IntentStatus::*;
        match self {
            Created => vec![Pending, Succeeded, Failed, Expired],
            Pending => vec![Succeeded, Failed],
            Succeeded | Failed | Expired => vec![],
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(IntentStatus::Created),
            "pending" => Ok(IntentStatus::Pending),
            "succeeded" => Ok(IntentStatus::Succeeded),
            "failed" => Ok(IntentStatus::Failed),
            "expired" => Ok(IntentStatus::Expired),
            other => Err(format!("unknown intent status '{}'", other)),
        }
    }
}
