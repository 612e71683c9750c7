//! Background delivery queue for storehook.
//!
//! This crate provides asynchronous webhook delivery using Redis:
//!
//! - **Jobs**: one `MakeRequestJob` per delivery request
//! - **Dispatch**: Redis-backed implementation of the dispatch trigger
//! - **Workers**: Concurrent job execution with Apalis
//! - **Retry**: Exponential backoff with dead letter entries

pub mod dispatch_impl;
pub mod jobs;
pub mod retry;
pub mod workers;

pub use dispatch_impl::{DEFAULT_QUEUE_NAMESPACE, RedisDispatchService, storage_config};
pub use jobs::*;
pub use retry::{DeadLetterEntry, RetryConfig};
pub use workers::*;
