//! Job definitions.

#![allow(missing_docs)]

mod make_request;

pub use make_request::MakeRequestJob;
