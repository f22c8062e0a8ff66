// src/services/quota_service.rs
//
// Guarda de quota de SMS. A regra central: o débito de crédito acontece
// exatamente uma vez por SMS entregue, nunca na tentativa e nunca duas
// vezes. O incremento é um comando condicional único no banco
// (subscription_repo::consume_sms_credit), não um read-then-write.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SubscriptionRepository,
    models::subscription::{QuotaStatus, Subscription},
};

#[derive(Clone)]
pub struct QuotaService {
    subscription_repo: SubscriptionRepository,
}

impl QuotaService {
    pub fn new(subscription_repo: SubscriptionRepository) -> Self {
        Self { subscription_repo }
    }

    /// Assinatura da organização. Cria a assinatura FREE no primeiro toque
    /// e zera os créditos quando o período de cobrança virou.
    pub async fn subscription_for(&self, organization_id: Uuid) -> Result<Subscription, AppError> {
        let sub = match self
            .subscription_repo
            .find_by_organization(organization_id)
            .await?
        {
            Some(sub) => sub,
            None => {
                tracing::info!(
                    "🆕 Criando assinatura FREE para a organização {}",
                    organization_id
                );
                self.subscription_repo.create_default(organization_id).await?
            }
        };

        if sub.period_expired(Utc::now()) {
            let new_end = sub
                .plan_type
                .period_days()
                .map(|days| Utc::now() + Duration::days(days));
            tracing::info!(
                "🔄 Período de cobrança renovado para a organização {}",
                organization_id
            );
            return self
                .subscription_repo
                .reset_period(organization_id, new_end)
                .await;
        }

        Ok(sub)
    }

    /// Pode enviar? {total, used, remaining, can_send}. Quota esgotada não é
    /// erro, é `can_send_sms = false`.
    pub async fn check(&self, organization_id: Uuid) -> Result<QuotaStatus, AppError> {
        let sub = self.subscription_for(organization_id).await?;
        Ok(QuotaStatus::from_subscription(&sub))
    }

    /// Debita 1 crédito após um envio confirmado. `false` = não havia
    /// crédito (a janela entre pré-checagem e envio fechou).
    pub async fn consume_sms_credit(&self, organization_id: Uuid) -> Result<bool, AppError> {
        let consumed = self
            .subscription_repo
            .consume_sms_credit(organization_id)
            .await?;
        Ok(consumed.is_some())
    }

    pub async fn track_email_sent(&self, organization_id: Uuid) -> Result<(), AppError> {
        self.subscription_repo
            .increment_email_sent(organization_id)
            .await
    }

    /// Renovação manual do período (ação administrativa).
    pub async fn renew_period(&self, organization_id: Uuid) -> Result<Subscription, AppError> {
        let sub = self.subscription_for(organization_id).await?;
        let new_end = sub
            .plan_type
            .period_days()
            .map(|days| Utc::now() + Duration::days(days));
        self.subscription_repo
            .reset_period(organization_id, new_end)
            .await
    }
}
