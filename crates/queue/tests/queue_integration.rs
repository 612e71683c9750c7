//! Queue integration tests.
//!
//! These tests verify the queue components work correctly together.

use std::time::Duration;

use storehook_core::DeliveryRequest;
use storehook_queue::{DEFAULT_QUEUE_NAMESPACE, MakeRequestJob, RetryConfig, storage_config};

#[test]
fn test_job_from_request_preserves_url() {
    let request = DeliveryRequest::new(
        "http://url.com/".to_string(),
        r#"{"event_type":"order.placed"}"#.to_string(),
    );

    let job = MakeRequestJob::from(request);

    assert_eq!(job.url, "http://url.com/");
    assert_eq!(job.payload, r#"{"event_type":"order.placed"}"#);
    assert!(job.subscriber_id.is_none());
    assert!(job.secret.is_none());
}

#[test]
fn test_job_from_subscriber_request_keeps_signing_data() {
    let request = DeliveryRequest::new(
        "https://example.com/hooks".to_string(),
        "{}".to_string(),
    )
    .for_subscriber("sub1".to_string(), "shh".to_string());

    let job = MakeRequestJob::from(request);

    assert_eq!(job.subscriber_id.as_deref(), Some("sub1"));
    assert_eq!(job.secret.as_deref(), Some("shh"));
}

#[test]
fn test_job_survives_queue_serialization() {
    // Jobs cross the Redis boundary as JSON; the URL parameter must come
    // back out exactly as it went in.
    let job = MakeRequestJob::new("http://url.com/".to_string(), "{}".to_string());

    let encoded = serde_json::to_string(&job).unwrap();
    let decoded: MakeRequestJob = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded.url, "http://url.com/");
}

#[test]
fn test_default_queue_namespace() {
    assert_eq!(DEFAULT_QUEUE_NAMESPACE, "spree_webhooks");
    // The config builder must accept the default namespace without panicking
    let _config = storage_config(DEFAULT_QUEUE_NAMESPACE);
}

#[test]
fn test_retry_schedule_is_bounded() {
    let config = RetryConfig::default();

    for attempt in 0..config.max_retries * 2 {
        assert!(config.delay_for_attempt(attempt) <= config.max_delay);
    }
    assert!(!config.should_retry(config.max_retries));
}

#[test]
fn test_retry_delays_grow_until_cap() {
    let config = RetryConfig {
        max_retries: 6,
        initial_delay: Duration::from_secs(10),
        max_delay: Duration::from_secs(100),
        multiplier: 2.0,
    };

    let mut last = Duration::ZERO;
    for attempt in 0..config.max_retries {
        let delay = config.delay_for_attempt(attempt);
        assert!(delay >= last);
        last = delay;
    }
    assert_eq!(last, Duration::from_secs(100));
}
