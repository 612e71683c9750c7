//! Common utilities and shared types for storehook.
//!
//! This crate provides foundational components used across all storehook crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Payload signing**: HMAC-SHA256 signatures for webhook payloads
//!
//! # Example
//!
//! ```no_run
//! use storehook_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod signature;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use signature::{SIGNATURE_HEADER, sign_payload, verify_payload};
