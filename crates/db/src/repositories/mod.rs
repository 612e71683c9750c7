//! Database repositories.

mod subscriber;

pub use subscriber::SubscriberRepository;
