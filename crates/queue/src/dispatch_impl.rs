//! Redis-backed webhook dispatch implementation.
//!
//! This module provides a Redis-based implementation of the `WebhookDispatch`
//! trait that queues jobs for the apalis worker to process.

use async_trait::async_trait;
use storehook_common::{AppError, AppResult};
use storehook_core::{DeliveryRequest, WebhookDispatch};

use crate::jobs::MakeRequestJob;

/// Logical queue name delivery jobs are recorded on.
pub const DEFAULT_QUEUE_NAMESPACE: &str = "spree_webhooks";

/// Build the Redis storage config for the given queue namespace.
#[must_use]
pub fn storage_config(namespace: &str) -> apalis_redis::Config {
    apalis_redis::Config::default().set_namespace(namespace)
}

/// Redis-backed webhook dispatch service.
///
/// This implementation pushes delivery jobs to Redis for processing by
/// the apalis make-request worker. A successful push means exactly one
/// job is durably recorded on the queue; nothing has been sent yet.
#[derive(Clone)]
pub struct RedisDispatchService {
    /// Redis storage for job queue (apalis-redis).
    storage: apalis_redis::RedisStorage<MakeRequestJob>,
}

impl RedisDispatchService {
    /// Create a new Redis dispatch service.
    #[must_use]
    pub const fn new(storage: apalis_redis::RedisStorage<MakeRequestJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl WebhookDispatch for RedisDispatchService {
    async fn queue_request(&self, request: DeliveryRequest) -> AppResult<()> {
        use apalis::prelude::*;

        let url = request.url.clone();
        let job = MakeRequestJob::from(request);

        self.storage
            .clone()
            .push(job)
            .await
            .map_err(|e| AppError::Queue(format!("Failed to queue job: {e}")))?;

        tracing::debug!(url = %url, "Queued delivery job");

        Ok(())
    }
}
