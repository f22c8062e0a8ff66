pub mod auth;
pub use auth::AuthService;
pub mod notification_service;
pub use notification_service::NotificationService;
pub mod providers;
pub mod queue_service;
pub use queue_service::QueueService;
pub mod quota_service;
pub use quota_service::QuotaService;
pub mod templates;
