// src/db/subscription_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::subscription::{PlanType, Subscription},
};

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let sub = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    /// Cria a assinatura no onboarding (roda na transação de registro).
    pub async fn create<'e, E>(
        &self,
        executor: E,
        organization_id: Uuid,
        plan_type: PlanType,
        period_end: Option<DateTime<Utc>>,
    ) -> Result<Subscription, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions
                (organization_id, plan_type, queue_limit,
                 sms_credits_total, current_period_end)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(plan_type)
        .bind(plan_type.queue_limit())
        .bind(plan_type.sms_credits())
        .bind(period_end)
        .fetch_one(executor)
        .await?;
        Ok(sub)
    }

    /// Assinatura FREE criada fora do fluxo de registro (organizações
    /// antigas tocadas pela primeira vez pela quota).
    pub async fn create_default(&self, organization_id: Uuid) -> Result<Subscription, AppError> {
        self.create(&self.pool, organization_id, PlanType::Free, None)
            .await
    }

    /// Consome 1 crédito de SMS de forma atômica: o incremento só acontece
    /// se ainda houver crédito, em um único comando condicional. Chamado
    /// apenas após o envio confirmado (decrement-on-confirm).
    /// None = não havia crédito disponível.
    pub async fn consume_sms_credit(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Subscription>, AppError> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET sms_credits_used = sms_credits_used + 1, updated_at = now()
            WHERE organization_id = $1
              AND status = 'ACTIVE'
              AND sms_credits_used < sms_credits_total
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sub)
    }

    /// E-mails não têm quota: apenas contabiliza.
    pub async fn increment_email_sent(&self, organization_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET email_sent_count = email_sent_count + 1, updated_at = now()
            WHERE organization_id = $1
            "#,
        )
        .bind(organization_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Zera os créditos usados e abre um novo período de cobrança.
    pub async fn reset_period(
        &self,
        organization_id: Uuid,
        period_end: Option<DateTime<Utc>>,
    ) -> Result<Subscription, AppError> {
        let sub = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET sms_credits_used = 0,
                current_period_start = now(),
                current_period_end = $2,
                updated_at = now()
            WHERE organization_id = $1
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(period_end)
        .fetch_one(&self.pool)
        .await?;
        Ok(sub)
    }
}
