//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};

/// Marker for a request that passed admin authentication.
#[derive(Debug, Clone, Copy)]
pub struct AdminCapability;

/// Admin capability extractor.
///
/// Handlers take this to state that they require the admin capability; the
/// permission check itself happens in the auth middleware.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth(pub AdminCapability);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the admin auth middleware
        parts
            .extensions
            .get::<AdminCapability>()
            .copied()
            .map(AdminAuth)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}
