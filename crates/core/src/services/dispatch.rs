//! Webhook dispatch trigger.
//!
//! Provides an abstraction for queueing outbound webhook delivery requests.
//! The actual implementation is provided by the queue crate; core services
//! only ever see the injected trait object, never the queue client itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storehook_common::AppResult;

/// A single webhook delivery request handed to the dispatch trigger.
///
/// The request is owned by the queue once `queue_request` returns; delivery
/// happens later, on an independent worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRequest {
    /// Target URL the request will be sent to.
    pub url: String,

    /// Serialized JSON body to deliver.
    pub payload: String,

    /// Originating subscriber, when the request came from the fan-out.
    pub subscriber_id: Option<String>,

    /// Signing secret for the payload, when the subscriber has one.
    pub secret: Option<String>,
}

impl DeliveryRequest {
    /// Create a delivery request for a bare target URL.
    #[must_use]
    pub const fn new(url: String, payload: String) -> Self {
        Self {
            url,
            payload,
            subscriber_id: None,
            secret: None,
        }
    }

    /// Attach the originating subscriber and its signing secret.
    #[must_use]
    pub fn for_subscriber(mut self, subscriber_id: String, secret: String) -> Self {
        self.subscriber_id = Some(subscriber_id);
        self.secret = Some(secret);
        self
    }
}

/// Trait for queueing webhook deliveries.
///
/// Implementations must guarantee that a successful return means exactly one
/// unit of work has been durably recorded on the delivery queue. They must
/// not perform the HTTP request themselves.
#[async_trait]
pub trait WebhookDispatch: Send + Sync {
    /// Queue a single delivery request.
    async fn queue_request(&self, request: DeliveryRequest) -> AppResult<()>;
}

/// A no-op implementation of `WebhookDispatch` for testing or when webhook
/// delivery is disabled.
#[derive(Clone, Default)]
pub struct NoOpDispatch;

#[async_trait]
impl WebhookDispatch for NoOpDispatch {
    async fn queue_request(&self, _request: DeliveryRequest) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `WebhookDispatch` trait object.
pub type DispatchService = Arc<dyn WebhookDispatch>;
