pub mod billing_month;
pub mod subscription;
