use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{billing::BillingUseCases, subscription::SubscriptionUseCases},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub subscription_use_cases: Arc<SubscriptionUseCases>,
    pub billing_use_cases: Arc<BillingUseCases>,
}
