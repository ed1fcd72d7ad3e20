//! Verified provider callbacks.

use serde::{Deserialize, Serialize};

use super::errors::WebhookError;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{IntentStatus, ProviderKind};

/// What a provider callback means for the intent it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackOutcome {
    Succeeded,
    Failed,
    /// Still in flight at the provider; nothing to apply.
    Pending,
    /// Event type the orchestrator does not act on.
    Ignored,
}

impl CallbackOutcome {
    /// Status the intent should move to, if any.
    pub fn target_status(&self) -> Option<IntentStatus> {
        match self {
            CallbackOutcome::Succeeded => Some(IntentStatus::Succeeded),
            CallbackOutcome::Failed => Some(IntentStatus::Failed),
            CallbackOutcome::Pending => Some(IntentStatus::Pending),
            CallbackOutcome::Ignored => None,
        }
    }
}

/// Provider-specific callback reduced to the fields the orchestrator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCallback {
    pub event_id: String,
    pub event_type: String,
    /// Provider reference of the payment; absent on ignored events.
    pub external_id: Option<String>,
    pub outcome: CallbackOutcome,
}

impl ProviderCallback {
    /// Callback for an event type with no effect on intents.
    pub fn ignored(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            external_id: None,
            outcome: CallbackOutcome::Ignored,
        }
    }
}

/// Translates a provider's callback body into a [`ProviderCallback`].
pub trait CallbackParser: Send + Sync {
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError>;
}

/// A signature-verified callback.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub provider: ProviderKind,
    pub provider_event_id: String,
    pub event_type: String,
    pub external_id: Option<String>,
    pub outcome: CallbackOutcome,
    pub payload: serde_json::Value,
    pub received_at: Timestamp,
    pub processed: bool,
}

impl WebhookEvent {
    pub fn from_callback(
        provider: ProviderKind,
        callback: ProviderCallback,
        payload: serde_json::Value,
        received_at: Timestamp,
    ) -> Self {
        Self {
            provider,
            provider_event_id: callback.event_id,
            event_type: callback.event_type,
            external_id: callback.external_id,
            outcome: callback.outcome,
            payload,
            received_at,
            processed: false,
        }
    }

    pub fn mark_processed(&mut self) {
        self.processed = true;
    }
}

/// Reads a required string field at a JSON pointer.
pub fn required_str<'a>(
    payload: &'a serde_json::Value,
    pointer: &'static str,
) -> Result<&'a str, WebhookError> {
    payload
        .pointer(pointer)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebhookError::MalformedPayload(format!("missing field {}", pointer)))
}
