pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenancyRepository;
pub mod queue_repo;
pub use queue_repo::QueueRepository;
pub mod subscription_repo;
pub use subscription_repo::SubscriptionRepository;
