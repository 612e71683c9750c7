//! Database entities.

pub mod subscriber;

pub use subscriber::Entity as Subscriber;
