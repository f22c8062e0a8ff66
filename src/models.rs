pub mod auth;
pub mod notification;
pub mod queue;
pub mod subscription;
pub mod tenancy;
