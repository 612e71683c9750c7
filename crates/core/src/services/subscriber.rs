//! Webhook subscriber service.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use serde_json::json;
use storehook_common::{AppError, AppResult, id::IdGenerator};
use storehook_db::entities::subscriber;
use storehook_db::repositories::SubscriberRepository;
use sea_orm::Set;
use url::Url;

use crate::services::dispatch::{DeliveryRequest, DispatchService};

/// Store events that can be delivered to subscribers.
pub mod events {
    pub const ORDER_PLACED: &str = "order.placed";
    pub const ORDER_CANCELED: &str = "order.canceled";
    pub const ORDER_RESUMED: &str = "order.resumed";
    pub const SHIPMENT_SHIPPED: &str = "shipment.shipped";
    pub const PRODUCT_ACTIVATED: &str = "product.activated";
    pub const PRODUCT_ARCHIVED: &str = "product.archived";
    pub const PRODUCT_DISCONTINUED: &str = "product.discontinued";
    pub const PRODUCT_BACK_IN_STOCK: &str = "product.back_in_stock";
    pub const PRODUCT_BACKORDERABLE: &str = "product.backorderable";
    pub const PRODUCT_OUT_OF_STOCK: &str = "product.out_of_stock";
    pub const VARIANT_BACK_IN_STOCK: &str = "variant.back_in_stock";
    pub const VARIANT_BACKORDERABLE: &str = "variant.backorderable";
    pub const VARIANT_OUT_OF_STOCK: &str = "variant.out_of_stock";
    pub const SUBSCRIBER_TEST: &str = "subscriber.test";

    /// Subscription entry matching every event.
    pub const WILDCARD: &str = "*";

    /// Get all valid events.
    #[must_use]
    pub fn all() -> Vec<&'static str> {
        vec![
            ORDER_PLACED,
            ORDER_CANCELED,
            ORDER_RESUMED,
            SHIPMENT_SHIPPED,
            PRODUCT_ACTIVATED,
            PRODUCT_ARCHIVED,
            PRODUCT_DISCONTINUED,
            PRODUCT_BACK_IN_STOCK,
            PRODUCT_BACKORDERABLE,
            PRODUCT_OUT_OF_STOCK,
            VARIANT_BACK_IN_STOCK,
            VARIANT_BACKORDERABLE,
            VARIANT_OUT_OF_STOCK,
            SUBSCRIBER_TEST,
        ]
    }

    /// Check if a subscription entry is valid.
    #[must_use]
    pub fn is_valid(event: &str) -> bool {
        event == WILDCARD || all().contains(&event)
    }
}

/// Input for creating a subscriber.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriberInput {
    pub name: String,
    pub url: String,
    pub subscriptions: Vec<String>,
}

/// Input for updating a subscriber.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriberInput {
    pub name: Option<String>,
    pub url: Option<String>,
    pub subscriptions: Option<Vec<String>>,
    pub active: Option<bool>,
}

/// Response for a subscriber.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    pub id: String,
    pub name: String,
    pub url: String,
    pub subscriptions: Vec<String>,
    pub active: bool,
    pub last_delivered_at: Option<String>,
    pub failure_count: i32,
    pub last_error: Option<String>,
    pub created_at: String,
}

impl From<subscriber::Model> for SubscriberResponse {
    fn from(s: subscriber::Model) -> Self {
        let subscriptions = s.subscription_list();
        Self {
            id: s.id,
            name: s.name,
            url: s.url,
            subscriptions,
            active: s.active,
            last_delivered_at: s.last_delivered_at.map(|t| t.to_rfc3339()),
            failure_count: s.failure_count,
            last_error: s.last_error,
            created_at: s.created_at.to_rfc3339(),
        }
    }
}

/// Response for subscriber creation (includes secret).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberWithSecretResponse {
    #[serde(flatten)]
    pub subscriber: SubscriberResponse,
    pub secret: String,
}

/// Webhook payload envelope delivered to subscribers.
#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    pub event_type: String,
    pub event_id: String,
    pub event_created_at: String,
    pub data: serde_json::Value,
}

impl WebhookPayload {
    /// Serialize the payload into the request body.
    pub fn body(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize payload: {e}")))
    }
}

/// Service for managing webhook subscribers and fanning out events.
#[derive(Clone)]
pub struct SubscriberService {
    subscriber_repo: SubscriberRepository,
    dispatch: DispatchService,
    max_subscribers: u64,
    id_gen: IdGenerator,
}

impl SubscriberService {
    /// Create a new subscriber service.
    #[must_use]
    pub fn new(
        subscriber_repo: SubscriberRepository,
        dispatch: DispatchService,
        max_subscribers: u64,
    ) -> Self {
        Self {
            subscriber_repo,
            dispatch,
            max_subscribers,
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Management ====================

    /// Create a new subscriber.
    pub async fn create(
        &self,
        input: CreateSubscriberInput,
    ) -> AppResult<SubscriberWithSecretResponse> {
        Self::validate_name(&input.name)?;
        Self::validate_url(&input.url)?;
        Self::validate_subscriptions(&input.subscriptions)?;

        // Check limit
        if self.subscriber_repo.at_limit(self.max_subscribers).await? {
            return Err(AppError::Validation(
                "Maximum number of subscribers reached".to_string(),
            ));
        }

        // Generate secret
        let secret = self.generate_secret();

        let now = chrono::Utc::now();
        let id = self.id_gen.generate();

        let model = subscriber::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            url: Set(input.url),
            secret: Set(secret.clone()),
            subscriptions: Set(json!(input.subscriptions)),
            active: Set(true),
            last_delivered_at: Set(None),
            failure_count: Set(0),
            last_error: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let subscriber = self.subscriber_repo.create(model).await?;

        Ok(SubscriberWithSecretResponse {
            subscriber: subscriber.into(),
            secret,
        })
    }

    /// Update a subscriber.
    pub async fn update(
        &self,
        subscriber_id: &str,
        input: UpdateSubscriberInput,
    ) -> AppResult<SubscriberResponse> {
        let subscriber = self.subscriber_repo.get_by_id(subscriber_id).await?;
        let mut active: subscriber::ActiveModel = subscriber.into();

        if let Some(name) = input.name {
            Self::validate_name(&name)?;
            active.name = Set(name);
        }

        if let Some(url) = input.url {
            Self::validate_url(&url)?;
            active.url = Set(url);
        }

        if let Some(subscriptions) = input.subscriptions {
            Self::validate_subscriptions(&subscriptions)?;
            active.subscriptions = Set(json!(subscriptions));
        }

        if let Some(is_active) = input.active {
            active.active = Set(is_active);
            // Reset failure count when re-enabling
            if is_active {
                active.failure_count = Set(0);
                active.last_error = Set(None);
            }
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.subscriber_repo.update(active).await?;
        Ok(updated.into())
    }

    /// Delete a subscriber.
    pub async fn delete(&self, subscriber_id: &str) -> AppResult<()> {
        self.subscriber_repo.delete(subscriber_id).await
    }

    /// List all subscribers.
    pub async fn list(&self) -> AppResult<Vec<SubscriberResponse>> {
        let subscribers = self.subscriber_repo.find_all().await?;
        Ok(subscribers.into_iter().map(Into::into).collect())
    }

    /// Get a subscriber by ID.
    pub async fn get(&self, subscriber_id: &str) -> AppResult<SubscriberResponse> {
        let subscriber = self.subscriber_repo.get_by_id(subscriber_id).await?;
        Ok(subscriber.into())
    }

    /// Regenerate the secret for a subscriber.
    pub async fn regenerate_secret(
        &self,
        subscriber_id: &str,
    ) -> AppResult<SubscriberWithSecretResponse> {
        let subscriber = self.subscriber_repo.get_by_id(subscriber_id).await?;

        let new_secret = self.generate_secret();

        let mut active: subscriber::ActiveModel = subscriber.into();
        active.secret = Set(new_secret.clone());
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.subscriber_repo.update(active).await?;

        Ok(SubscriberWithSecretResponse {
            subscriber: updated.into(),
            secret: new_secret,
        })
    }

    // ==================== Dispatch ====================

    /// Fan an event out to every active subscriber that wants it.
    ///
    /// One delivery request is queued per matching subscriber. Returning `Ok`
    /// means the requests are recorded on the queue, not that anything has
    /// been delivered.
    pub async fn trigger(&self, event: &str, data: serde_json::Value) -> AppResult<()> {
        let subscribers = self
            .subscriber_repo
            .find_active_matching_event(event)
            .await?;

        tracing::info!(
            event = %event,
            subscriber_count = subscribers.len(),
            "Queueing webhook deliveries"
        );

        for subscriber in subscribers {
            let payload = self.build_payload(event, data.clone());
            let request = DeliveryRequest::new(subscriber.url.clone(), payload.body()?)
                .for_subscriber(subscriber.id.clone(), subscriber.secret.clone());

            self.dispatch.queue_request(request).await?;

            tracing::debug!(
                subscriber_id = %subscriber.id,
                url = %subscriber.url,
                "Queued delivery request"
            );
        }

        Ok(())
    }

    /// Queue a synthetic test event at a single subscriber.
    pub async fn test(&self, subscriber_id: &str) -> AppResult<()> {
        let subscriber = self.subscriber_repo.get_by_id(subscriber_id).await?;

        let payload = self.build_payload(
            events::SUBSCRIBER_TEST,
            json!({ "message": "This is a test webhook delivery" }),
        );
        let request = DeliveryRequest::new(subscriber.url, payload.body()?)
            .for_subscriber(subscriber.id, subscriber.secret);

        self.dispatch.queue_request(request).await
    }

    // ==================== Helper Methods ====================

    fn build_payload(&self, event: &str, data: serde_json::Value) -> WebhookPayload {
        WebhookPayload {
            event_type: event.to_string(),
            event_id: self.id_gen.generate(),
            event_created_at: chrono::Utc::now().to_rfc3339(),
            data,
        }
    }

    fn generate_secret(&self) -> String {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn validate_name(name: &str) -> AppResult<()> {
        if name.is_empty() || name.len() > 100 {
            return Err(AppError::Validation(
                "Name must be between 1 and 100 characters".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_url(raw: &str) -> AppResult<()> {
        let parsed =
            Url::parse(raw).map_err(|e| AppError::Validation(format!("Invalid URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::Validation(
                "URL must use the http or https scheme".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_subscriptions(subscriptions: &[String]) -> AppResult<()> {
        if subscriptions.is_empty() {
            return Err(AppError::Validation(
                "At least one subscription must be specified".to_string(),
            ));
        }
        for event in subscriptions {
            if !events::is_valid(event) {
                return Err(AppError::Validation(format!("Invalid event: {event}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dispatch::WebhookDispatch;
    use async_trait::async_trait;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::{Arc, Mutex};

    /// Dispatcher that records queued requests instead of touching Redis.
    #[derive(Clone, Default)]
    struct RecordingDispatch {
        requests: Arc<Mutex<Vec<DeliveryRequest>>>,
    }

    impl RecordingDispatch {
        fn queued(&self) -> Vec<DeliveryRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookDispatch for RecordingDispatch {
        async fn queue_request(&self, request: DeliveryRequest) -> AppResult<()> {
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }

    fn create_mock_subscriber(id: &str, url: &str, subscriptions: serde_json::Value) -> subscriber::Model {
        subscriber::Model {
            id: id.to_string(),
            name: format!("Subscriber {id}"),
            url: url.to_string(),
            secret: "shh".to_string(),
            subscriptions,
            active: true,
            last_delivered_at: None,
            failure_count: 0,
            last_error: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(
        rows: Vec<subscriber::Model>,
        dispatch: RecordingDispatch,
    ) -> SubscriberService {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        );
        let repo = SubscriberRepository::new(db);
        SubscriberService::new(repo, Arc::new(dispatch), 25)
    }

    #[tokio::test]
    async fn test_trigger_queues_exactly_one_request_per_url() {
        // The dispatch contract: one trigger, one pending unit of work
        // carrying the target URL.
        let dispatch = RecordingDispatch::default();
        let sub = create_mock_subscriber("sub1", "http://url.com/", json!(["*"]));
        let service = service_with(vec![sub], dispatch.clone());

        service
            .trigger(events::ORDER_PLACED, json!({"number": "R123456789"}))
            .await
            .unwrap();

        let queued = dispatch.queued();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].url, "http://url.com/");
        assert_eq!(queued[0].subscriber_id.as_deref(), Some("sub1"));
    }

    #[tokio::test]
    async fn test_trigger_skips_non_matching_subscriptions() {
        let dispatch = RecordingDispatch::default();
        let matching = create_mock_subscriber(
            "sub1",
            "https://a.example.com/",
            json!(["order.placed"]),
        );
        let other = create_mock_subscriber(
            "sub2",
            "https://b.example.com/",
            json!(["product.activated"]),
        );
        let service = service_with(vec![matching, other], dispatch.clone());

        service
            .trigger(events::ORDER_PLACED, json!({}))
            .await
            .unwrap();

        let queued = dispatch.queued();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].url, "https://a.example.com/");
    }

    #[tokio::test]
    async fn test_trigger_with_no_subscribers_queues_nothing() {
        let dispatch = RecordingDispatch::default();
        let service = service_with(vec![], dispatch.clone());

        service
            .trigger(events::SHIPMENT_SHIPPED, json!({}))
            .await
            .unwrap();

        assert!(dispatch.queued().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_payload_carries_event_envelope() {
        let dispatch = RecordingDispatch::default();
        let sub = create_mock_subscriber("sub1", "https://example.com/", json!(["*"]));
        let service = service_with(vec![sub], dispatch.clone());

        service
            .trigger(events::ORDER_CANCELED, json!({"number": "R1"}))
            .await
            .unwrap();

        let queued = dispatch.queued();
        let body: serde_json::Value = serde_json::from_str(&queued[0].payload).unwrap();
        assert_eq!(body["event_type"], "order.canceled");
        assert_eq!(body["data"]["number"], "R1");
        assert!(body["event_id"].as_str().is_some());
        assert!(body["event_created_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url() {
        let dispatch = RecordingDispatch::default();
        let service = service_with(vec![], dispatch);

        let result = service
            .create(CreateSubscriberInput {
                name: "Bad".to_string(),
                url: "ftp://example.com/".to_string(),
                subscriptions: vec!["*".to_string()],
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_event() {
        let dispatch = RecordingDispatch::default();
        let service = service_with(vec![], dispatch);

        let result = service
            .create(CreateSubscriberInput {
                name: "Bad".to_string(),
                url: "https://example.com/".to_string(),
                subscriptions: vec!["order.exploded".to_string()],
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_subscriptions() {
        let dispatch = RecordingDispatch::default();
        let service = service_with(vec![], dispatch);

        let result = service
            .create(CreateSubscriberInput {
                name: "Bad".to_string(),
                url: "https://example.com/".to_string(),
                subscriptions: vec![],
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_test_queues_synthetic_event() {
        let dispatch = RecordingDispatch::default();
        let sub = create_mock_subscriber("sub1", "https://example.com/", json!(["order.placed"]));
        let service = service_with(vec![sub], dispatch.clone());

        service.test("sub1").await.unwrap();

        let queued = dispatch.queued();
        assert_eq!(queued.len(), 1);
        let body: serde_json::Value = serde_json::from_str(&queued[0].payload).unwrap();
        assert_eq!(body["event_type"], "subscriber.test");
    }

    #[test]
    fn test_events_validity() {
        assert!(events::is_valid(events::ORDER_PLACED));
        assert!(events::is_valid(events::WILDCARD));
        assert!(!events::is_valid("order.exploded"));
        assert!(!events::is_valid(""));
    }

    #[test]
    fn test_stock_events_are_subscribable() {
        assert!(events::is_valid("product.backorderable"));
        assert!(events::is_valid("variant.backorderable"));
        assert!(events::is_valid("product.back_in_stock"));
        assert!(events::is_valid("variant.out_of_stock"));
    }
}
