use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, warn};

use crate::infra::{config::AppConfig, error::InfraError};

const BACKOFF_STEP: Duration = Duration::from_secs(1);

/// Connect, retrying with linear backoff, then apply pending migrations.
/// Gives up once `db_connect_deadline` has passed, whatever attempt is running.
pub async fn init_db(config: &AppConfig) -> Result<PgPool, InfraError> {
    let options = PgPoolOptions::new().max_connections(config.db_max_connections);
    let url = config.db_url.expose_secret();

    let pool = tokio::time::timeout(
        config.db_connect_deadline,
        connect_with_retry(config.db_connect_attempts, BACKOFF_STEP, || {
            options.clone().connect(url)
        }),
    )
    .await
    .map_err(|_| InfraError::DatabaseDeadline {
        secs: config.db_connect_deadline.as_secs(),
    })??;

    info!("Connected to database!");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(InfraError::Migration)?;

    info!("Database migrations applied");
    Ok(pool)
}

/// Run `connect` up to `attempts` times, sleeping `step * n` after the n-th failure.
pub async fn connect_with_retry<T, F, Fut>(
    attempts: u32,
    step: Duration,
    mut connect: F,
) -> Result<T, InfraError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 1;
    loop {
        match connect().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                let delay = step * attempt;
                warn!(attempt, retry_in_ms = delay.as_millis() as u64, error = %err, "Postgres connection failed, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(InfraError::DatabaseConnection(err)),
        }
    }
}
