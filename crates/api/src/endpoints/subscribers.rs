//! Subscriber endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use storehook_common::AppResult;
use storehook_core::{
    CreateSubscriberInput, SubscriberResponse, SubscriberWithSecretResponse, UpdateSubscriberInput,
};

use crate::{extractors::AdminAuth, middleware::AppState, response::ApiResponse};

/// Request to get a subscriber.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSubscriberRequest {
    pub subscriber_id: String,
}

/// Request to update a subscriber.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriberRequest {
    pub subscriber_id: String,
    #[serde(flatten)]
    pub input: UpdateSubscriberInput,
}

/// Request to delete a subscriber.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSubscriberRequest {
    pub subscriber_id: String,
}

/// Request to regenerate a subscriber secret.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateSecretRequest {
    pub subscriber_id: String,
}

/// Request to queue a test delivery at a subscriber.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSubscriberRequest {
    pub subscriber_id: String,
}

/// Create a new subscriber.
async fn create_subscriber(
    AdminAuth(_): AdminAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateSubscriberInput>,
) -> AppResult<ApiResponse<SubscriberWithSecretResponse>> {
    let subscriber = state.subscriber_service.create(input).await?;
    Ok(ApiResponse::ok(subscriber))
}

/// List all subscribers.
async fn list_subscribers(
    AdminAuth(_): AdminAuth,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<SubscriberResponse>>> {
    let subscribers = state.subscriber_service.list().await?;
    Ok(ApiResponse::ok(subscribers))
}

/// Get a subscriber by ID.
async fn get_subscriber(
    AdminAuth(_): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<GetSubscriberRequest>,
) -> AppResult<ApiResponse<SubscriberResponse>> {
    let subscriber = state.subscriber_service.get(&req.subscriber_id).await?;
    Ok(ApiResponse::ok(subscriber))
}

/// Update a subscriber.
async fn update_subscriber(
    AdminAuth(_): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<UpdateSubscriberRequest>,
) -> AppResult<ApiResponse<SubscriberResponse>> {
    let subscriber = state
        .subscriber_service
        .update(&req.subscriber_id, req.input)
        .await?;
    Ok(ApiResponse::ok(subscriber))
}

/// Delete a subscriber.
async fn delete_subscriber(
    AdminAuth(_): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<DeleteSubscriberRequest>,
) -> AppResult<ApiResponse<()>> {
    state.subscriber_service.delete(&req.subscriber_id).await?;
    Ok(ApiResponse::ok(()))
}

/// Regenerate the secret for a subscriber.
async fn regenerate_secret(
    AdminAuth(_): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<RegenerateSecretRequest>,
) -> AppResult<ApiResponse<SubscriberWithSecretResponse>> {
    let subscriber = state
        .subscriber_service
        .regenerate_secret(&req.subscriber_id)
        .await?;
    Ok(ApiResponse::ok(subscriber))
}

/// Queue a test delivery at a subscriber.
async fn test_subscriber(
    AdminAuth(_): AdminAuth,
    State(state): State<AppState>,
    Json(req): Json<TestSubscriberRequest>,
) -> AppResult<ApiResponse<()>> {
    state.subscriber_service.test(&req.subscriber_id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_subscriber))
        .route("/list", post(list_subscribers))
        .route("/show", post(get_subscriber))
        .route("/update", post(update_subscriber))
        .route("/delete", post(delete_subscriber))
        .route("/regenerate-secret", post(regenerate_secret))
        .route("/test", post(test_subscriber))
}
