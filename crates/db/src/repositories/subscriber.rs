//! Webhook subscriber repository.

use std::sync::Arc;

use crate::entities::{Subscriber, subscriber};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use storehook_common::{AppError, AppResult};

/// Consecutive failures after which a subscriber is disabled.
pub const MAX_FAILURE_COUNT: i32 = 5;

/// Subscriber repository for database operations.
#[derive(Clone)]
pub struct SubscriberRepository {
    db: Arc<DatabaseConnection>,
}

impl SubscriberRepository {
    /// Create a new subscriber repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a subscriber by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<subscriber::Model>> {
        Subscriber::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a subscriber by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<subscriber::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::SubscriberNotFound(id.to_string()))
    }

    /// Find all subscribers, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<subscriber::Model>> {
        Subscriber::find()
            .order_by_desc(subscriber::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all active subscribers that subscribe to a specific event.
    pub async fn find_active_matching_event(
        &self,
        event: &str,
    ) -> AppResult<Vec<subscriber::Model>> {
        // Get all active subscribers, then filter subscriptions in code
        // since JSON array queries are complex
        let subscribers = Subscriber::find()
            .filter(subscriber::Column::Active.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(subscribers
            .into_iter()
            .filter(|s| s.subscribes_to(event))
            .collect())
    }

    /// Count all subscribers.
    pub async fn count(&self) -> AppResult<u64> {
        Subscriber::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new subscriber.
    pub async fn create(&self, model: subscriber::ActiveModel) -> AppResult<subscriber::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a subscriber.
    pub async fn update(&self, model: subscriber::ActiveModel) -> AppResult<subscriber::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a subscriber.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        // Ensure it exists so deletion of an unknown ID surfaces as 404
        self.get_by_id(id).await?;

        Subscriber::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record a successful delivery.
    pub async fn record_success(&self, id: &str) -> AppResult<()> {
        let subscriber = self.get_by_id(id).await?;
        let mut active: subscriber::ActiveModel = subscriber.into();

        active.last_delivered_at = Set(Some(chrono::Utc::now().into()));
        active.failure_count = Set(0);
        active.last_error = Set(None);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Record a failed delivery.
    ///
    /// The subscriber is disabled once `MAX_FAILURE_COUNT` consecutive
    /// failures accumulate.
    pub async fn record_failure(&self, id: &str, error: &str) -> AppResult<()> {
        let subscriber = self.get_by_id(id).await?;
        let failure_count = subscriber.failure_count + 1;

        let mut active: subscriber::ActiveModel = subscriber.into();
        active.failure_count = Set(failure_count);
        active.last_error = Set(Some(error.to_string()));

        if failure_count >= MAX_FAILURE_COUNT {
            tracing::warn!(
                subscriber_id = %id,
                failure_count = failure_count,
                "Disabling subscriber after repeated delivery failures"
            );
            active.active = Set(false);
        }

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Disable a subscriber.
    pub async fn disable(&self, id: &str) -> AppResult<()> {
        let subscriber = self.get_by_id(id).await?;
        let mut active: subscriber::ActiveModel = subscriber.into();

        active.active = Set(false);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Check whether the store has reached the subscriber limit.
    pub async fn at_limit(&self, max_subscribers: u64) -> AppResult<bool> {
        let count = self.count().await?;
        Ok(count >= max_subscribers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;

    fn create_test_subscriber(id: &str, active: bool, subscriptions: serde_json::Value) -> subscriber::Model {
        subscriber::Model {
            id: id.to_string(),
            name: "Test subscriber".to_string(),
            url: "https://example.com/hooks".to_string(),
            secret: "secret".to_string(),
            subscriptions,
            active,
            last_delivered_at: None,
            failure_count: 0,
            last_error: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_subscriber() {
        let sub = create_test_subscriber("sub1", true, json!(["*"]));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sub.clone()]])
                .into_connection(),
        );

        let repo = SubscriberRepository::new(db);
        let result = repo.find_by_id("sub1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "sub1");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<subscriber::Model>::new()])
                .into_connection(),
        );

        let repo = SubscriberRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::SubscriberNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_active_matching_event_filters_subscriptions() {
        let matching = create_test_subscriber("sub1", true, json!(["order.placed"]));
        let wildcard = create_test_subscriber("sub2", true, json!(["*"]));
        let other = create_test_subscriber("sub3", true, json!(["product.activated"]));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[matching, wildcard, other]])
                .into_connection(),
        );

        let repo = SubscriberRepository::new(db);
        let results = repo.find_active_matching_event("order.placed").await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "sub1");
        assert_eq!(results[1].id, "sub2");
    }

    #[tokio::test]
    async fn test_record_failure_disables_at_threshold() {
        let mut sub = create_test_subscriber("sub1", true, json!(["*"]));
        sub.failure_count = MAX_FAILURE_COUNT - 1;

        let mut disabled = sub.clone();
        disabled.failure_count = MAX_FAILURE_COUNT;
        disabled.active = false;
        disabled.last_error = Some("HTTP 500".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sub]])
                .append_query_results([[disabled]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = SubscriberRepository::new(db);
        repo.record_failure("sub1", "HTTP 500").await.unwrap();
    }

    #[tokio::test]
    async fn test_at_limit() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(3)]])
                .into_connection(),
        );

        let repo = SubscriberRepository::new(db);
        assert!(repo.at_limit(3).await.unwrap());
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        std::collections::BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }
}
