pub mod billing;
pub mod subscription;
