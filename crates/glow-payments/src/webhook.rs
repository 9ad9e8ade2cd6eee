//! Webhook Envelope & Signature
//!
//! The provider pushes `{event, object: {id}}` with at-least-once delivery.
//! The payload is only trusted far enough to extract the charge id;
//! reconciliation re-fetches the authoritative status. Before any of that,
//! the raw body must carry a valid HMAC-SHA256 signature under the shared
//! webhook secret.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw request body
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

const EVENT_SUCCEEDED: &str = "payment.succeeded";
const EVENT_WAITING_FOR_CAPTURE: &str = "payment.waiting_for_capture";

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    object: EnvelopeObject,
}

#[derive(Debug, Deserialize)]
struct EnvelopeObject {
    id: String,
}

/// A syntactically accepted webhook delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A payment-relevant event; reconcile this charge
    PaymentChanged { charge_id: String },

    /// Acknowledged but not payment-relevant
    Ignored { event: String },
}

/// Parse the provider's event envelope
pub fn parse_event(body: &str) -> Result<WebhookEvent> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

    match envelope.event.as_str() {
        EVENT_SUCCEEDED | EVENT_WAITING_FOR_CAPTURE => Ok(WebhookEvent::PaymentChanged {
            charge_id: envelope.object.id,
        }),
        _ => Ok(WebhookEvent::Ignored {
            event: envelope.event,
        }),
    }
}

/// Hex HMAC-SHA256 of `body` under `secret` (what a well-behaved sender puts
/// in [`SIGNATURE_HEADER`])
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a delivery's signature header against the raw body.
/// Comparison is constant-time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> Result<()> {
    let provided =
        hex::decode(signature.trim()).map_err(|_| PaymentError::InvalidSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| PaymentError::InvalidSignature)
}
