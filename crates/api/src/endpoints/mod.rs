//! API endpoints.

mod subscribers;

use axum::Router;

use crate::middleware::AppState;

/// Build the API router.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new().nest("/subscribers", subscribers::router())
}
