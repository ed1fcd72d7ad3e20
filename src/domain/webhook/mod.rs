//! Webhook domain: signature verification and callback interpretation.

mod errors;
mod event;
mod recent_events;
mod verifier;

pub use errors::WebhookError;
pub use event::{required_str, CallbackOutcome, CallbackParser, ProviderCallback, WebhookEvent};
pub use recent_events::RecentEventCache;
pub use verifier::{
    sign_payload, signature_header_name, SignatureHeader, SignatureScheme, WebhookVerifier,
};
