//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use storehook_common::AppError;
use storehook_core::SubscriberService;

use crate::extractors::AdminCapability;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub subscriber_service: SubscriberService,
    /// Admin token required for management calls; `None` leaves the API open.
    pub admin_token: Option<String>,
}

/// Admin authentication middleware.
///
/// Checks the bearer token against the configured admin token and attaches
/// an [`AdminCapability`] to the request. Requests without a valid token are
/// rejected with 401 rather than silently ignored.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(expected) = &state.admin_token {
        let presented = request
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if presented != Some(expected.as_str()) {
            return AppError::Unauthorized.into_response();
        }
    }

    request.extensions_mut().insert(AdminCapability);
    next.run(request).await
}
