//! Webhook subscriber entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Webhook subscriber model.
///
/// A subscriber registers a target URL and the set of store events it wants
/// delivered there. The `subscriptions` column holds a JSON array of event
/// names; the single entry `"*"` subscribes to every event.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriber")]
pub struct Model {
    /// Unique identifier.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Subscriber name for display.
    pub name: String,

    /// Target URL deliveries are sent to.
    #[sea_orm(column_type = "Text")]
    pub url: String,

    /// Secret for signing delivery payloads.
    pub secret: String,

    /// Events this subscriber is subscribed to (JSON array).
    #[sea_orm(column_type = "JsonBinary")]
    pub subscriptions: Json,

    /// Is this subscriber active?
    #[sea_orm(default_value = true)]
    pub active: bool,

    /// Last time a delivery to this subscriber succeeded.
    #[sea_orm(nullable)]
    pub last_delivered_at: Option<DateTimeWithTimeZone>,

    /// Count of consecutive failed delivery attempts.
    #[sea_orm(default_value = 0)]
    pub failure_count: i32,

    /// Last delivery error message (if any).
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,

    /// When this subscriber was created.
    pub created_at: DateTimeWithTimeZone,

    /// When this subscriber was last updated.
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The event names this subscriber is subscribed to.
    #[must_use]
    pub fn subscription_list(&self) -> Vec<String> {
        serde_json::from_value(self.subscriptions.clone()).unwrap_or_default()
    }

    /// Whether this subscriber wants the given event delivered.
    ///
    /// The wildcard subscription `"*"` matches every event.
    #[must_use]
    pub fn subscribes_to(&self, event: &str) -> bool {
        self.subscription_list()
            .iter()
            .any(|s| s == "*" || s == event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn subscriber_with(subscriptions: serde_json::Value) -> Model {
        Model {
            id: "sub1".to_string(),
            name: "Test subscriber".to_string(),
            url: "https://example.com/hooks".to_string(),
            secret: "secret".to_string(),
            subscriptions,
            active: true,
            last_delivered_at: None,
            failure_count: 0,
            last_error: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_subscribes_to_exact_event() {
        let sub = subscriber_with(json!(["order.placed", "order.canceled"]));

        assert!(sub.subscribes_to("order.placed"));
        assert!(!sub.subscribes_to("product.activated"));
    }

    #[test]
    fn test_wildcard_matches_every_event() {
        let sub = subscriber_with(json!(["*"]));

        assert!(sub.subscribes_to("order.placed"));
        assert!(sub.subscribes_to("product.discontinued"));
    }

    #[test]
    fn test_malformed_subscriptions_match_nothing() {
        let sub = subscriber_with(json!("not-an-array"));

        assert!(!sub.subscribes_to("order.placed"));
    }
}
