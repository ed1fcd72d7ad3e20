//! Mock provider adapter for testing.
//!
//! Configurable stand-in for any [`ProviderKind`]:
//! - async, synchronous or failing creates
//! - artificial latency, to exercise concurrent submissions
//! - call tracking
//!
//! Callbacks use a minimal JSON shape:
//! `{"id": "...", "type": "payment.succeeded" | "payment.failed" | ..., "external_id": "..."}`.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::IntentId;
use crate::domain::payment::{CheckoutDetails, ProviderKind, RegionalMethod};
use crate::domain::webhook::{
    required_str, CallbackOutcome, CallbackParser, ProviderCallback, WebhookError,
};
use crate::ports::{ProviderAdapter, ProviderError, ProviderPayment, ProviderPaymentRequest};

/// How `create` behaves.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Returns a pending payment with a redirect URL.
    Pending,
    /// Settles during the create call.
    Synchronous,
    /// Fails with the given error.
    Fail(ProviderError),
}

/// Mock provider adapter.
pub struct MockProviderAdapter {
    kind: ProviderKind,
    delay: Option<Duration>,
    accepts_callbacks: bool,
    inner: Mutex<MockState>,
}

struct MockState {
    behavior: MockBehavior,
    calls: Vec<IntentId>,
}

impl MockProviderAdapter {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            delay: None,
            accepts_callbacks: true,
            inner: Mutex::new(MockState {
                behavior: MockBehavior::Pending,
                calls: Vec::new(),
            }),
        }
    }

    /// Adapter whose creates settle immediately.
    pub fn synchronous(kind: ProviderKind) -> Self {
        let mock = Self::new(kind);
        mock.set_behavior(MockBehavior::Synchronous);
        mock
    }

    /// Adapter whose creates always fail.
    pub fn failing(kind: ProviderKind, error: ProviderError) -> Self {
        let mock = Self::new(kind);
        mock.set_behavior(MockBehavior::Fail(error));
        mock
    }

    /// Sleep this long inside every create call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Refuse callbacks, like bank transfer does.
    pub fn without_callbacks(mut self) -> Self {
        self.accepts_callbacks = false;
        self
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        self.state().behavior = behavior;
    }

    /// Number of create calls so far.
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Intents passed to create, in call order.
    pub fn calls(&self) -> Vec<IntentId> {
        self.state().calls.clone()
    }

    /// External id the mock assigns to an intent.
    pub fn external_id_for(intent_id: &IntentId) -> String {
        format!("mock_{}", intent_id.as_uuid().simple())
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProviderAdapter for MockProviderAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn create(
        &self,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let behavior = {
            let mut state = self.state();
            state.calls.push(request.intent_id);
            state.behavior.clone()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let external_id = Self::external_id_for(&request.intent_id);
        match behavior {
            MockBehavior::Fail(error) => Err(error),
            MockBehavior::Synchronous => Ok(ProviderPayment {
                external_id,
                checkout: CheckoutDetails::default(),
                synchronous: true,
            }),
            MockBehavior::Pending => Ok(ProviderPayment {
                checkout: CheckoutDetails {
                    redirect_url: Some(format!("https://mock.example/pay/{}", external_id)),
                    ..Default::default()
                },
                external_id,
                synchronous: false,
            }),
        }
    }

    fn accepts_callbacks(&self) -> bool {
        self.accepts_callbacks
    }

    fn supports_method(&self, method: Option<RegionalMethod>) -> bool {
        match (self.kind, method) {
            (ProviderKind::Regional, Some(method)) => method.is_integrated(),
            (ProviderKind::Regional, None) => false,
            (_, method) => method.is_none(),
        }
    }
}

impl CallbackParser for MockProviderAdapter {
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
        let event_id = required_str(payload, "/id")?;
        let event_type = required_str(payload, "/type")?;

        let outcome = match event_type {
            "payment.succeeded" => CallbackOutcome::Succeeded,
            "payment.failed" => CallbackOutcome::Failed,
            "payment.pending" => CallbackOutcome::Pending,
            _ => return Ok(ProviderCallback::ignored(event_id, event_type)),
        };

        Ok(ProviderCallback {
            event_id: event_id.to_string(),
            event_type: event_type.to_string(),
            external_id: Some(required_str(payload, "/external_id")?.to_string()),
            outcome,
        })
    }
}
