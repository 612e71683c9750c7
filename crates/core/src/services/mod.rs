//! Domain services.

mod dispatch;
mod subscriber;

pub use dispatch::{DeliveryRequest, DispatchService, NoOpDispatch, WebhookDispatch};
pub use subscriber::{
    CreateSubscriberInput, SubscriberResponse, SubscriberService, SubscriberWithSecretResponse,
    UpdateSubscriberInput, WebhookPayload, events,
};
