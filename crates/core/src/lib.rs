//! Core business logic for storehook.

pub mod services;

pub use services::*;
