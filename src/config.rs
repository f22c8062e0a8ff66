// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{QueueRepository, SubscriptionRepository, TenancyRepository, UserRepository},
    services::{AuthService, NotificationService, QueueService, QuotaService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub queue_service: QueueService,
    pub quota_service: QuotaService,
    pub tenancy_repo: TenancyRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenancy_repo = TenancyRepository::new(db_pool.clone());
        let queue_repo = QueueRepository::new(db_pool.clone());
        let subscription_repo = SubscriptionRepository::new(db_pool.clone());

        // Provedores de SMS/e-mail resolvidos UMA vez, aqui. Depois disso
        // o ambiente não é mais consultado.
        let notification_service = NotificationService::from_env();

        let quota_service = QuotaService::new(subscription_repo.clone());
        let auth_service = AuthService::new(
            user_repo,
            tenancy_repo.clone(),
            subscription_repo,
            jwt_secret,
            db_pool.clone(),
        );
        let queue_service = QueueService::new(
            queue_repo,
            tenancy_repo.clone(),
            quota_service.clone(),
            notification_service,
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            auth_service,
            queue_service,
            quota_service,
            tenancy_repo,
        })
    }
}
