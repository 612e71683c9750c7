//! Webhook delivery job.

use serde::{Deserialize, Serialize};
use storehook_core::DeliveryRequest;

/// Job to deliver a webhook payload to a target URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeRequestJob {
    /// Target URL.
    pub url: String,

    /// Serialized JSON body to send.
    pub payload: String,

    /// Originating subscriber, when known.
    pub subscriber_id: Option<String>,

    /// Signing secret for the payload, when the subscriber has one.
    pub secret: Option<String>,
}

impl MakeRequestJob {
    /// Create a new delivery job for a bare URL.
    #[must_use]
    pub const fn new(url: String, payload: String) -> Self {
        Self {
            url,
            payload,
            subscriber_id: None,
            secret: None,
        }
    }
}

impl From<DeliveryRequest> for MakeRequestJob {
    fn from(request: DeliveryRequest) -> Self {
        Self {
            url: request.url,
            payload: request.payload,
            subscriber_id: request.subscriber_id,
            secret: request.secret,
        }
    }
}
