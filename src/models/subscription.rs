// src/models/subscription.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "plan_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanType {
    Free,
    Pro,
    Business,
}

impl PlanType {
    // Limites por plano. FREE não tem crédito de SMS: toda notificação
    // cai no fallback por e-mail.
    pub fn sms_credits(&self) -> i32 {
        match self {
            PlanType::Free => 0,
            PlanType::Pro => 100,
            PlanType::Business => 500,
        }
    }

    pub fn queue_limit(&self) -> i32 {
        match self {
            PlanType::Free => 1,
            PlanType::Pro => 5,
            PlanType::Business => 999,
        }
    }

    // Período de cobrança em dias; FREE não expira.
    pub fn period_days(&self) -> Option<i64> {
        match self {
            PlanType::Free => None,
            PlanType::Pro | PlanType::Business => Some(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Cancelled,
}

// --- ASSINATURA ---

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,

    pub queue_limit: i32,
    pub sms_credits_total: i32,
    pub sms_credits_used: i32,
    pub email_sent_count: i32,

    pub current_period_start: DateTime<Utc>,
    pub current_period_end: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    pub fn period_expired(&self, now: DateTime<Utc>) -> bool {
        self.current_period_end.is_some_and(|end| end < now)
    }
}

// Status de quota exposto como leitura: {total, used, remaining, can_send}.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub plan_type: PlanType,
    pub total_credits: i32,
    pub used_credits: i32,
    pub remaining_credits: i32,
    pub can_send_sms: bool,
}

impl QuotaStatus {
    pub fn from_subscription(sub: &Subscription) -> Self {
        let remaining = (sub.sms_credits_total - sub.sms_credits_used).max(0);
        Self {
            plan_type: sub.plan_type,
            total_credits: sub.sms_credits_total,
            used_credits: sub.sms_credits_used,
            remaining_credits: remaining,
            can_send_sms: sub.is_active() && remaining > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(plan: PlanType, used: i32, status: SubscriptionStatus) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            plan_type: plan,
            status,
            queue_limit: plan.queue_limit(),
            sms_credits_total: plan.sms_credits(),
            sms_credits_used: used,
            email_sent_count: 0,
            current_period_start: now,
            current_period_end: plan.period_days().map(|d| now + chrono::Duration::days(d)),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn limites_dos_planos() {
        assert_eq!(PlanType::Free.sms_credits(), 0);
        assert_eq!(PlanType::Pro.sms_credits(), 100);
        assert_eq!(PlanType::Business.sms_credits(), 500);
        assert_eq!(PlanType::Free.queue_limit(), 1);
        assert_eq!(PlanType::Pro.queue_limit(), 5);
    }

    #[test]
    fn plano_free_nunca_pode_enviar_sms() {
        let quota =
            QuotaStatus::from_subscription(&subscription(PlanType::Free, 0, SubscriptionStatus::Active));
        assert!(!quota.can_send_sms);
        assert_eq!(quota.remaining_credits, 0);
    }

    #[test]
    fn quota_esgotada_bloqueia_envio() {
        let quota =
            QuotaStatus::from_subscription(&subscription(PlanType::Pro, 100, SubscriptionStatus::Active));
        assert!(!quota.can_send_sms);
        assert_eq!(quota.remaining_credits, 0);

        let quota =
            QuotaStatus::from_subscription(&subscription(PlanType::Pro, 99, SubscriptionStatus::Active));
        assert!(quota.can_send_sms);
        assert_eq!(quota.remaining_credits, 1);
    }

    #[test]
    fn assinatura_cancelada_nao_envia_mesmo_com_credito() {
        let quota = QuotaStatus::from_subscription(&subscription(
            PlanType::Business,
            0,
            SubscriptionStatus::Cancelled,
        ));
        assert!(!quota.can_send_sms);
        assert_eq!(quota.remaining_credits, 500);
    }

    #[test]
    fn expiracao_do_periodo() {
        let mut sub = subscription(PlanType::Pro, 10, SubscriptionStatus::Active);
        let now = Utc::now();
        assert!(!sub.period_expired(now));
        sub.current_period_end = Some(now - chrono::Duration::days(1));
        assert!(sub.period_expired(now));
        sub.current_period_end = None;
        assert!(!sub.period_expired(now));
    }
}
