//! Subscription CRUD and billing total routes.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    use_cases::{
        billing::TotalInput,
        subscription::{CreateSubscriptionInput, UpdateSubscriptionInput},
    },
};

#[derive(Serialize)]
struct TotalResponse {
    total: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_subscription))
        .route("/total", get(get_total))
        .route(
            "/{id}",
            get(get_subscription)
                .patch(update_subscription)
                .delete(delete_subscription),
        )
}

/// POST /subscriptions
async fn create_subscription(
    State(app_state): State<AppState>,
    payload: Result<Json<CreateSubscriptionInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload.map_err(invalid_json)?;
    let created = app_state.subscription_use_cases.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /subscriptions/{id}
async fn get_subscription(
    State(app_state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let id = subscription_id(id)?;
    let subscription = app_state.subscription_use_cases.get(id).await?;
    Ok(Json(subscription))
}

/// PATCH /subscriptions/{id}
/// Only `price` and `end_date` can change.
async fn update_subscription(
    State(app_state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateSubscriptionInput>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = subscription_id(id)?;
    let Json(input) = payload.map_err(invalid_json)?;
    let updated = app_state.subscription_use_cases.update(id, input).await?;
    Ok(Json(updated))
}

/// DELETE /subscriptions/{id}
async fn delete_subscription(
    State(app_state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<impl IntoResponse> {
    let id = subscription_id(id)?;
    app_state.subscription_use_cases.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /subscriptions/total?user_id=&service_name=&from=&to=
async fn get_total(
    State(app_state): State<AppState>,
    query: Result<Query<TotalInput>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(input) = query
        .map_err(|rejection| AppError::InvalidInput(format!("invalid query: {rejection}")))?;
    let total = app_state.billing_use_cases.get_total(input).await?;
    Ok(Json(TotalResponse { total }))
}

fn subscription_id(id: Result<Path<Uuid>, PathRejection>) -> AppResult<Uuid> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::InvalidInput("invalid id format".into()))
}

fn invalid_json(rejection: JsonRejection) -> AppError {
    AppError::InvalidInput(format!("invalid JSON: {}", rejection.body_text()))
}
