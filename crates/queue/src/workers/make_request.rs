//! Make-request worker.

use apalis::prelude::*;
use reqwest::Client;
use storehook_common::signature::{SIGNATURE_HEADER, sign_payload};
use storehook_db::repositories::SubscriberRepository;
use thiserror::Error as ThisError;
use tracing::{error, info, warn};

use crate::jobs::MakeRequestJob;
use crate::retry::{DeadLetterEntry, RetryConfig};

/// Context for the make-request worker.
#[derive(Clone)]
pub struct MakeRequestContext {
    pub subscriber_repo: SubscriberRepository,
    pub http_client: Client,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl MakeRequestContext {
    /// Create a new make-request context.
    ///
    /// # Panics
    /// Panics if the HTTP client fails to build.
    #[must_use]
    #[allow(clippy::expect_used)] // Client build only fails with incompatible TLS settings
    pub fn new(
        subscriber_repo: SubscriberRepository,
        request_timeout_secs: u64,
        user_agent: String,
    ) -> Self {
        Self {
            subscriber_repo,
            http_client: Client::builder()
                .timeout(std::time::Duration::from_secs(request_timeout_secs))
                .build()
                .expect("Failed to create HTTP client"),
            user_agent,
            retry: RetryConfig::default(),
        }
    }
}

/// Outcome of a delivery attempt that does not fail the job.
enum DeliveryOutcome {
    /// The subscriber accepted the payload.
    Delivered,
    /// The target answered 410; the subscriber is gone for good.
    SubscriberGone,
}

/// A failed delivery attempt.
#[derive(Debug, ThisError)]
enum DeliveryError {
    /// The target rejected the request; retrying would not help.
    #[error("{0}")]
    Permanent(String),
    /// The target or the network misbehaved; worth retrying.
    #[error("{0}")]
    Transient(String),
}

/// Worker function for delivering webhook payloads.
///
/// # Errors
/// Returns an error once the retry schedule is exhausted, so the backend
/// records the job as failed.
pub async fn make_request_worker(
    job: MakeRequestJob,
    ctx: Data<MakeRequestContext>,
) -> Result<(), Error> {
    info!(url = %job.url, "Delivering webhook");

    match deliver_with_retry(&job, &ctx).await {
        Ok(DeliveryOutcome::Delivered) => {
            info!(url = %job.url, "Webhook delivered successfully");
            if let Some(subscriber_id) = &job.subscriber_id
                && let Err(e) = ctx.subscriber_repo.record_success(subscriber_id).await
            {
                warn!(subscriber_id = %subscriber_id, error = %e, "Failed to record delivery");
            }
            Ok(())
        }
        Ok(DeliveryOutcome::SubscriberGone) => {
            warn!(url = %job.url, "Target gone (410), disabling subscriber");
            if let Some(subscriber_id) = &job.subscriber_id
                && let Err(e) = ctx.subscriber_repo.disable(subscriber_id).await
            {
                warn!(subscriber_id = %subscriber_id, error = %e, "Failed to disable subscriber");
            }
            Ok(())
        }
        Err(e) => {
            error!(url = %job.url, error = %e, "Failed to deliver webhook");
            if let Some(subscriber_id) = &job.subscriber_id
                && let Err(db_err) = ctx
                    .subscriber_repo
                    .record_failure(subscriber_id, &e.to_string())
                    .await
            {
                warn!(subscriber_id = %subscriber_id, error = %db_err, "Failed to record failure");
            }
            let e: Box<dyn std::error::Error + Send + Sync> = e.into();
            Err(Error::Failed(e.into()))
        }
    }
}

/// Attempt the delivery, retrying transient failures on the backoff schedule.
///
/// Permanent failures (4xx other than 410) return immediately; transient
/// failures (5xx, network errors) sleep and retry until the schedule is
/// exhausted, at which point the job is dead-lettered.
async fn deliver_with_retry(
    job: &MakeRequestJob,
    ctx: &MakeRequestContext,
) -> Result<DeliveryOutcome, DeliveryError> {
    let mut attempt = 0;

    loop {
        match make_request(job, ctx).await {
            Ok(outcome) => return Ok(outcome),
            Err(e @ DeliveryError::Permanent(_)) => return Err(e),
            Err(DeliveryError::Transient(msg)) => {
                if !ctx.retry.should_retry(attempt) {
                    let entry = DeadLetterEntry::new(job.clone(), attempt + 1, msg.clone());
                    error!(
                        url = %entry.job.url,
                        attempts = entry.attempts,
                        error = %entry.last_error,
                        "Delivery retries exhausted"
                    );
                    return Err(DeliveryError::Transient(msg));
                }

                let delay = ctx.retry.delay_for_attempt(attempt);
                warn!(
                    url = %job.url,
                    attempt = attempt + 1,
                    delay_secs = delay.as_secs(),
                    error = %msg,
                    "Delivery attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

async fn make_request(
    job: &MakeRequestJob,
    ctx: &MakeRequestContext,
) -> Result<DeliveryOutcome, DeliveryError> {
    let mut request = ctx
        .http_client
        .post(&job.url)
        .header("Content-Type", "application/json")
        .header("User-Agent", &ctx.user_agent)
        .body(job.payload.clone());

    // Sign the body when the subscriber has a secret
    if let Some(secret) = &job.secret {
        let signature = sign_payload(&job.payload, secret);
        request = request.header(SIGNATURE_HEADER, signature);
    }

    let response = request
        .send()
        .await
        .map_err(|e| DeliveryError::Transient(format!("Request failed: {e}")))?;
    let status = response.status();

    if status.is_success() {
        Ok(DeliveryOutcome::Delivered)
    } else if status.as_u16() == 410 {
        // Gone - the endpoint no longer exists
        Ok(DeliveryOutcome::SubscriberGone)
    } else if status.is_client_error() {
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Permanent(format!(
            "Client error {status}: {body}"
        )))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Transient(format!(
            "Server error {status}: {body}"
        )))
    }
}
