use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, db_error_code, sqlstate, violated_constraint},
    app_error::{AppError, AppResult},
    application::use_cases::{
        billing::{BillingRepo, TotalQuery},
        subscription::{CreateOutcome, SubscriptionRepo, UpdateOutcome},
    },
    domain::entities::{billing_month::BillingMonth, subscription::Subscription},
};

// Subscription row as stored in the db.
#[derive(sqlx::FromRow, Debug)]
struct SubscriptionRow {
    id: Uuid,
    service_name: String,
    price: i64,
    user_id: Uuid,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: row.id,
            service_name: row.service_name,
            price: row.price,
            user_id: row.user_id,
            start_date: BillingMonth::from_date(row.start_date),
            end_date: row.end_date.map(BillingMonth::from_date),
        }
    }
}

const END_AFTER_START_CONSTRAINT: &str = "subscriptions_end_after_start";

const RETURNING_COLS: &str = "id, service_name, price, user_id, start_date, end_date";

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn create(&self, subscription: &Subscription) -> AppResult<CreateOutcome> {
        // Overlap check and insert in one statement; the exclusion constraint
        // catches the race where two of these run concurrently.
        let result = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date)
               SELECT $1::uuid, $2::text, $3::bigint, $4::uuid, $5::date, $6::date
               WHERE NOT EXISTS (
                   SELECT 1
                   FROM subscriptions
                   WHERE user_id = $4
                     AND service_name = $2
                     AND start_date < COALESCE($6::date, 'infinity'::date)
                     AND COALESCE(end_date, 'infinity'::date) > $5
               )
               RETURNING {RETURNING_COLS}"#
        ))
        .bind(subscription.id)
        .bind(&subscription.service_name)
        .bind(subscription.price)
        .bind(subscription.user_id)
        .bind(subscription.start_date.as_date())
        .bind(subscription.end_date.map(|m| m.as_date()))
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(CreateOutcome::Created(row.into())),
            Ok(None) => Ok(CreateOutcome::Overlapping),
            Err(err) if db_error_code(&err).as_deref() == Some(sqlstate::EXCLUSION_VIOLATION) => {
                Ok(CreateOutcome::Overlapping)
            }
            Err(err) => Err(AppError::from(err)),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {RETURNING_COLS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(Subscription::from))
    }

    async fn update(
        &self,
        id: Uuid,
        price: i64,
        end_date: Option<BillingMonth>,
    ) -> AppResult<UpdateOutcome> {
        let result = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"UPDATE subscriptions
               SET price = $2, end_date = $3, updated_at = now()
               WHERE id = $1
               RETURNING {RETURNING_COLS}"#
        ))
        .bind(id)
        .bind(price)
        .bind(end_date.map(|m| m.as_date()))
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(UpdateOutcome::Updated(row.into())),
            Ok(None) => Ok(UpdateOutcome::NotFound),
            Err(err) => match db_error_code(&err).as_deref() {
                Some(sqlstate::CHECK_VIOLATION)
                    if violated_constraint(&err) == Some(END_AFTER_START_CONSTRAINT) =>
                {
                    Ok(UpdateOutcome::EndNotAfterStart)
                }
                Some(sqlstate::EXCLUSION_VIOLATION) => Ok(UpdateOutcome::Overlapping),
                _ => Err(AppError::from(err)),
            },
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}

#[async_trait]
impl BillingRepo for PostgresPersistence {
    async fn total_cost(&self, query: &TotalQuery) -> AppResult<i64> {
        // Months are counted on the intersection of [start_date, end_date) and [$3, $4).
        let result = sqlx::query_scalar::<_, i64>(
            r#"SELECT COALESCE(SUM(
                   price * (
                       (EXTRACT(YEAR FROM LEAST(COALESCE(end_date, $4), $4))
                          - EXTRACT(YEAR FROM GREATEST(start_date, $3))) * 12
                       + (EXTRACT(MONTH FROM LEAST(COALESCE(end_date, $4), $4))
                          - EXTRACT(MONTH FROM GREATEST(start_date, $3)))
                   )
               ), 0)::BIGINT AS total
               FROM subscriptions
               WHERE user_id = $1
                 AND ($2::text IS NULL OR service_name = $2)
                 AND start_date < $4
                 AND COALESCE(end_date, 'infinity'::date) > $3"#,
        )
        .bind(query.user_id)
        .bind(query.service_name.as_deref())
        .bind(query.from.as_date())
        .bind(query.to.as_date())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(total) => Ok(total),
            Err(err)
                if db_error_code(&err).as_deref() == Some(sqlstate::NUMERIC_VALUE_OUT_OF_RANGE) =>
            {
                tracing::error!(user_id = %query.user_id, "Total does not fit in BIGINT");
                Err(AppError::Internal("total out of range".into()))
            }
            Err(err) => Err(AppError::from(err)),
        }
    }
}
