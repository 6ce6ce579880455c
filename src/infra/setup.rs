use crate::{
    adapters::http::app_state::AppState,
    infra::{config::AppConfig, error::InfraError, postgres_persistence},
    use_cases::{
        billing::{BillingRepo, BillingUseCases},
        subscription::{SubscriptionRepo, SubscriptionUseCases},
    },
};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state(config: AppConfig) -> Result<AppState, InfraError> {
    let postgres_arc = Arc::new(postgres_persistence(&config).await?);

    let subscription_use_cases =
        SubscriptionUseCases::new(postgres_arc.clone() as Arc<dyn SubscriptionRepo>);
    let billing_use_cases = BillingUseCases::new(postgres_arc.clone() as Arc<dyn BillingRepo>);

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases: Arc::new(subscription_use_cases),
        billing_use_cases: Arc::new(billing_use_cases),
    })
}

/// Default filter when `RUST_LOG` is unset: `log_level` for this crate and tower_http.
fn default_filter(log_level: &str) -> String {
    format!("subledger={log_level},tower_http={log_level}")
}

pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    if config.env.is_production() {
        // Structured JSON logs
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .ok();
    } else {
        // Console (pretty logs)
        let console_layer = fmt::layer()
            .with_target(false) // don't show target (module path)
            .with_level(true)
            .pretty();

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .try_init()
            .ok();
    }
}
