use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators::{
        MAX_PRICE, is_valid_price, is_valid_service_name, parse_month_field,
        parse_optional_month_field, parse_user_id,
    },
    domain::entities::{billing_month::BillingMonth, subscription::Subscription},
};

// ============================================================================
// Repository Trait
// ============================================================================

/// Result of the conditional insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Subscription),
    /// Another subscription of the same user and service covers part of the period.
    Overlapping,
}

/// Result of a price / end date update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Subscription),
    NotFound,
    /// The new end date is not after the stored start date.
    EndNotAfterStart,
    /// The new end date would make this period overlap another one.
    /// Updates are held to the same non-overlap rule as inserts.
    Overlapping,
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Insert `subscription` only if no period of the same user and service overlaps it.
    /// Must be a single atomic write.
    async fn create(&self, subscription: &Subscription) -> AppResult<CreateOutcome>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>>;

    /// Change price and end date. Refuses an end date that is not after the
    /// stored start or that extends the period into another one, so an update
    /// can never leave overlapping periods behind.
    async fn update(
        &self,
        id: Uuid,
        price: i64,
        end_date: Option<BillingMonth>,
    ) -> AppResult<UpdateOutcome>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;
}

// ============================================================================
// Inputs
// ============================================================================

/// Create request as received; every field is checked by `create`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSubscriptionInput {
    pub service_name: Option<String>,
    pub price: Option<i64>,
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriptionInput {
    pub price: Option<i64>,
    pub end_date: Option<String>,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionUseCases {
    repo: Arc<dyn SubscriptionRepo>,
}

impl SubscriptionUseCases {
    pub fn new(repo: Arc<dyn SubscriptionRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateSubscriptionInput) -> AppResult<Subscription> {
        let subscription = validate_create(input)?;

        match self.repo.create(&subscription).await? {
            CreateOutcome::Created(created) => {
                info!(
                    subscription_id = %created.id,
                    user_id = %created.user_id,
                    service = %created.service_name,
                    "Subscription created"
                );
                Ok(created)
            }
            CreateOutcome::Overlapping => Err(AppError::Conflict(
                "subscription period overlaps with existing one".into(),
            )),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> AppResult<Subscription> {
        let subscription = self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        info!(subscription_id = %id, "Subscription fetched");
        Ok(subscription)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, input: UpdateSubscriptionInput) -> AppResult<Subscription> {
        let price = input
            .price
            .ok_or_else(|| AppError::InvalidInput("price is required".into()))?;
        if !is_valid_price(price) {
            return Err(AppError::InvalidInput(format!(
                "price must be between 0 and {MAX_PRICE}"
            )));
        }
        let end_date = parse_optional_month_field("end_date", input.end_date.as_deref())?;

        match self.repo.update(id, price, end_date).await? {
            UpdateOutcome::Updated(updated) => {
                info!(subscription_id = %updated.id, price, "Subscription updated");
                Ok(updated)
            }
            UpdateOutcome::NotFound => Err(AppError::NotFound),
            UpdateOutcome::EndNotAfterStart => Err(AppError::InvalidInput(
                "end_date must be after start_date".into(),
            )),
            UpdateOutcome::Overlapping => Err(AppError::Conflict(
                "subscription period overlaps with existing one".into(),
            )),
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound);
        }
        info!(subscription_id = %id, "Subscription deleted");
        Ok(())
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}

/// Checks run in order: required fields, price sign, date formats, date order.
fn validate_create(input: CreateSubscriptionInput) -> AppResult<Subscription> {
    let service_name = input
        .service_name
        .filter(|name| is_valid_service_name(name))
        .ok_or_else(|| AppError::InvalidInput("service_name is required".into()))?;
    let price = input
        .price
        .ok_or_else(|| AppError::InvalidInput("price is required".into()))?;
    let raw_user_id = input
        .user_id
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("user_id is required".into()))?;
    let raw_start = input
        .start_date
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("start_date is required".into()))?;

    if !is_valid_price(price) {
        return Err(AppError::InvalidInput(format!(
            "price must be between 0 and {MAX_PRICE}"
        )));
    }

    let user_id = parse_user_id(&raw_user_id)?;
    let start_date = parse_month_field("start_date", &raw_start)?;
    let end_date = parse_optional_month_field("end_date", input.end_date.as_deref())?;

    if end_date.is_some_and(|end| end <= start_date) {
        return Err(AppError::InvalidInput(
            "end_date must be after start_date".into(),
        ));
    }

    Ok(Subscription {
        id: Uuid::new_v4(),
        service_name: service_name.trim().to_string(),
        price,
        user_id,
        start_date,
        end_date,
    })
}
