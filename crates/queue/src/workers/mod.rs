//! Job workers.

mod make_request;

pub use make_request::{MakeRequestContext, make_request_worker};
