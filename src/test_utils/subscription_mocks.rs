//! In-memory mock implementations of the subscription and billing ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        billing::{BillingRepo, TotalQuery},
        subscription::{CreateOutcome, SubscriptionRepo, UpdateOutcome},
    },
    domain::entities::{billing_month::BillingMonth, subscription::Subscription},
};

/// In-memory implementation of `SubscriptionRepo` and `BillingRepo`.
///
/// The whole check-and-insert runs under one lock, matching the atomicity of
/// the conditional insert in Postgres.
#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<Uuid, Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo without running the overlap check.
    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        let map = subscriptions.into_iter().map(|s| (s.id, s)).collect();
        Self {
            subscriptions: Mutex::new(map),
        }
    }

    /// Get all subscriptions (for test assertions).
    pub fn get_all(&self) -> Vec<Subscription> {
        self.subscriptions.lock().unwrap().values().cloned().collect()
    }
}

fn conflicts_with(
    existing: &Subscription,
    user_id: Uuid,
    service_name: &str,
    start: BillingMonth,
    end: Option<BillingMonth>,
) -> bool {
    existing.user_id == user_id
        && existing.service_name == service_name
        && existing.overlaps(start, end)
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn create(&self, subscription: &Subscription) -> AppResult<CreateOutcome> {
        let mut subscriptions = self.subscriptions.lock().unwrap();

        let overlapping = subscriptions.values().any(|existing| {
            conflicts_with(
                existing,
                subscription.user_id,
                &subscription.service_name,
                subscription.start_date,
                subscription.end_date,
            )
        });
        if overlapping {
            return Ok(CreateOutcome::Overlapping);
        }

        subscriptions.insert(subscription.id, subscription.clone());
        Ok(CreateOutcome::Created(subscription.clone()))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        price: i64,
        end_date: Option<BillingMonth>,
    ) -> AppResult<UpdateOutcome> {
        let mut subscriptions = self.subscriptions.lock().unwrap();

        let Some(current) = subscriptions.get(&id).cloned() else {
            return Ok(UpdateOutcome::NotFound);
        };
        if end_date.is_some_and(|end| end <= current.start_date) {
            return Ok(UpdateOutcome::EndNotAfterStart);
        }
        let overlapping = subscriptions.values().any(|other| {
            other.id != id
                && conflicts_with(
                    other,
                    current.user_id,
                    &current.service_name,
                    current.start_date,
                    end_date,
                )
        });
        if overlapping {
            return Ok(UpdateOutcome::Overlapping);
        }

        let updated = Subscription {
            price,
            end_date,
            ..current
        };
        subscriptions.insert(id, updated.clone());
        Ok(UpdateOutcome::Updated(updated))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.subscriptions.lock().unwrap().remove(&id).is_some())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl BillingRepo for InMemorySubscriptionRepo {
    async fn total_cost(&self, query: &TotalQuery) -> AppResult<i64> {
        let subscriptions = self.subscriptions.lock().unwrap();
        let total = subscriptions
            .values()
            .filter(|s| s.user_id == query.user_id)
            .filter(|s| {
                query
                    .service_name
                    .as_deref()
                    .is_none_or(|name| s.service_name == name)
            })
            .try_fold(0i64, |total, s| {
                s.cost_within(query.from, query.to)
                    .and_then(|cost| total.checked_add(cost))
            })
            .ok_or_else(|| AppError::Internal("total out of range".into()));
        total
    }
}

/// A repository whose backend is always down.
#[derive(Default)]
pub struct UnavailableSubscriptionRepo;

fn backend_down<T>() -> AppResult<T> {
    Err(AppError::Database("Database operation failed".into()))
}

#[async_trait]
impl SubscriptionRepo for UnavailableSubscriptionRepo {
    async fn create(&self, _subscription: &Subscription) -> AppResult<CreateOutcome> {
        backend_down()
    }

    async fn get_by_id(&self, _id: Uuid) -> AppResult<Option<Subscription>> {
        backend_down()
    }

    async fn update(
        &self,
        _id: Uuid,
        _price: i64,
        _end_date: Option<BillingMonth>,
    ) -> AppResult<UpdateOutcome> {
        backend_down()
    }

    async fn delete(&self, _id: Uuid) -> AppResult<bool> {
        backend_down()
    }

    async fn ping(&self) -> AppResult<()> {
        backend_down()
    }
}

#[async_trait]
impl BillingRepo for UnavailableSubscriptionRepo {
    async fn total_cost(&self, _query: &TotalQuery) -> AppResult<i64> {
        backend_down()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_subscription, month};

    #[tokio::test]
    async fn test_in_memory_create_and_get() {
        let repo = InMemorySubscriptionRepo::new();
        let sub = create_test_subscription(|_| {});

        let outcome = repo.create(&sub).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created(sub.clone()));
        assert_eq!(repo.get_by_id(sub.id).await.unwrap(), Some(sub));
    }

    #[tokio::test]
    async fn test_in_memory_create_detects_overlap() {
        let first = create_test_subscription(|s| {
            s.start_date = month("01-2024");
            s.end_date = Some(month("06-2024"));
        });
        let repo = InMemorySubscriptionRepo::with_subscriptions(vec![first.clone()]);

        let second = create_test_subscription(|s| {
            s.user_id = first.user_id;
            s.start_date = month("05-2024");
        });
        assert_eq!(
            repo.create(&second).await.unwrap(),
            CreateOutcome::Overlapping
        );
    }

    #[tokio::test]
    async fn test_unavailable_repo_fails_everything() {
        let repo = UnavailableSubscriptionRepo;
        assert!(matches!(repo.ping().await, Err(AppError::Database(_))));
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(AppError::Database(_))
        ));
    }
}
