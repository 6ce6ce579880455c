use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators::{parse_month_field, parse_optional_month_field, parse_user_id},
    domain::entities::billing_month::BillingMonth,
};

/// A validated total request. `from < to` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalQuery {
    pub user_id: Uuid,
    pub service_name: Option<String>,
    pub from: BillingMonth,
    pub to: BillingMonth,
}

#[async_trait]
pub trait BillingRepo: Send + Sync {
    /// Sum of `price * billed months` over every matching subscription, read in one statement.
    async fn total_cost(&self, query: &TotalQuery) -> AppResult<i64>;
}

/// Raw query string of `GET /subscriptions/total`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TotalInput {
    pub user_id: Option<String>,
    pub service_name: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Clone)]
pub struct BillingUseCases {
    repo: Arc<dyn BillingRepo>,
}

impl BillingUseCases {
    pub fn new(repo: Arc<dyn BillingRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn get_total(&self, input: TotalInput) -> AppResult<i64> {
        let query = validate_total(input, BillingMonth::current())?;
        let total = self.repo.total_cost(&query).await?;

        info!(
            user_id = %query.user_id,
            service = query.service_name.as_deref().unwrap_or("*"),
            from = %query.from,
            to = %query.to,
            total,
            "Total calculated"
        );
        Ok(total)
    }
}

/// `default_to` is used when the request has no `to`.
fn validate_total(input: TotalInput, default_to: BillingMonth) -> AppResult<TotalQuery> {
    let raw_user_id = input
        .user_id
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("user_id is required".into()))?;
    let user_id = parse_user_id(&raw_user_id)?;

    let service_name = input
        .service_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty());

    let raw_from = input
        .from
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| AppError::InvalidInput("from is required".into()))?;
    let from = parse_month_field("from", &raw_from)?;
    let to = parse_optional_month_field("to", input.to.as_deref())?.unwrap_or(default_to);

    if from >= to {
        return Err(AppError::InvalidRange(
            "from must be strictly before to".into(),
        ));
    }

    Ok(TotalQuery {
        user_id,
        service_name,
        from,
        to,
    })
}
