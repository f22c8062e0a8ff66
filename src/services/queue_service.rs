// src/services/queue_service.rs
//
// Gerencia o ciclo de vida das entradas de fila:
// WAITING -> CALLED -> SERVED | NO_SHOW, com CANCELLED a partir de
// WAITING/CALLED. É o único lugar que coordena quota + despacho de
// notificação, e a regra é rígida: falha de notificação NUNCA desfaz
// uma transição de estado da fila.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{QueueRepository, TenancyRepository},
    models::{
        notification::{DeliveryResult, NotificationKind, NotificationReport, NotifiedVia},
        queue::{
            CreateQueuePayload, EntryActionResponse, EntryPositionResponse, EntryStatus,
            JoinQueuePayload, Queue, QueueEntry, QueueListFilter, QueueStatusResponse,
            UpdateQueuePayload, estimate_wait_minutes, format_wait,
        },
        subscription::QuotaStatus,
    },
    services::{QuotaService, notification_service::NotificationService, templates},
};

/// Canal registrado na entrada após uma tentativa de notificação.
/// SMS entregue ganha de e-mail entregue; tentativas sem nenhum sucesso
/// viram UNREACHABLE (terminal, sem retentativa); nenhuma tentativa, nada.
pub fn delivery_outcome(
    sms: Option<&DeliveryResult>,
    email: Option<&DeliveryResult>,
) -> Option<NotifiedVia> {
    if sms.is_some_and(|r| r.success) {
        return Some(NotifiedVia::Sms);
    }
    if email.is_some_and(|r| r.success) {
        return Some(NotifiedVia::Email);
    }
    if sms.is_some() || email.is_some() {
        return Some(NotifiedVia::Unreachable);
    }
    None
}

/// Decisão do canal SMS antes de qualquer chamada de rede.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmsPlan {
    /// Telefone presente e crédito disponível: envia.
    Send,
    /// Telefone presente mas sem crédito: a falha entra no relatório sem
    /// tocar a rede.
    RecordQuotaExceeded,
    /// Sem telefone: SMS nem aparece no relatório.
    Skip,
}

pub fn plan_sms(has_phone: bool, quota: Option<&QuotaStatus>) -> SmsPlan {
    match (has_phone, quota) {
        (false, _) => SmsPlan::Skip,
        (true, Some(quota)) if quota.can_send_sms => SmsPlan::Send,
        (true, _) => SmsPlan::RecordQuotaExceeded,
    }
}

/// Posição mostrada ao cliente: 1 + quantos WAITING na frente. Nunca a
/// posição absoluta, que é monotônica e não reinicia quando entradas
/// anteriores são atendidas ou canceladas.
pub fn waiting_rank(ahead: i64) -> i32 {
    (ahead + 1).clamp(1, i32::MAX as i64) as i32
}

#[derive(Clone)]
pub struct QueueService {
    queue_repo: QueueRepository,
    tenancy_repo: TenancyRepository,
    quota: QuotaService,
    notifications: NotificationService,
    pool: PgPool,
}

impl QueueService {
    pub fn new(
        queue_repo: QueueRepository,
        tenancy_repo: TenancyRepository,
        quota: QuotaService,
        notifications: NotificationService,
        pool: PgPool,
    ) -> Self {
        Self {
            queue_repo,
            tenancy_repo,
            quota,
            notifications,
            pool,
        }
    }

    // ---
    // Filas
    // ---

    pub async fn create_queue(
        &self,
        organization_id: Uuid,
        payload: &CreateQueuePayload,
    ) -> Result<Queue, AppError> {
        if payload.has_orphan_event_fields() {
            return Err(AppError::EventNameRequired);
        }

        // O local precisa existir e ser da organização do chamador.
        let location = self
            .tenancy_repo
            .find_location(payload.location_id)
            .await?
            .ok_or(AppError::LocationNotFound)?;
        if location.organization_id != organization_id {
            return Err(AppError::LocationNotFound);
        }

        if let Some(service_id) = payload.service_id {
            self.tenancy_repo
                .find_service(service_id)
                .await?
                .ok_or(AppError::ServiceNotFound)?;
        }

        // Limite de filas do plano.
        let subscription = self.quota.subscription_for(organization_id).await?;
        let active_queues = self
            .queue_repo
            .count_active_for_organization(organization_id)
            .await?;
        if active_queues >= subscription.queue_limit as i64 {
            return Err(AppError::QueueLimitReached(subscription.queue_limit));
        }

        self.queue_repo
            .create_queue(
                &payload.name,
                payload.description.as_deref(),
                payload.service_id,
                payload.location_id,
                payload.event_name.as_deref(),
                payload.event_start_date,
                payload.event_end_date,
                payload.is_mobile_queue,
                payload.max_capacity,
                payload.estimated_service_time,
            )
            .await
    }

    pub async fn list_queues(
        &self,
        organization_id: Uuid,
        filter: &QueueListFilter,
    ) -> Result<Vec<Queue>, AppError> {
        if let Some(location_id) = filter.location_id {
            return self.queue_repo.list_by_location(location_id).await;
        }
        if let Some(event_name) = &filter.event_name {
            return self.queue_repo.list_by_event(event_name).await;
        }
        if filter.mobile_only {
            return self.queue_repo.list_mobile_queues().await;
        }
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            return self.queue_repo.list_by_date_range(start, end).await;
        }
        self.queue_repo.list_for_organization(organization_id).await
    }

    pub async fn get_queue(
        &self,
        organization_id: Uuid,
        queue_id: Uuid,
    ) -> Result<Queue, AppError> {
        let ctx = self
            .queue_repo
            .queue_context(queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;
        if ctx.organization_id != organization_id {
            return Err(AppError::QueueNotFound);
        }
        self.queue_repo
            .find_by_id(queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)
    }

    /// Atualização parcial de capacidade, campos de evento e ativação.
    /// A validação de evento órfão vale para o resultado da mesclagem.
    pub async fn update_queue(
        &self,
        organization_id: Uuid,
        queue_id: Uuid,
        payload: &UpdateQueuePayload,
    ) -> Result<Queue, AppError> {
        let queue = self.get_queue(organization_id, queue_id).await?;
        if payload.leaves_orphan_event_fields(&queue) {
            return Err(AppError::EventNameRequired);
        }

        self.queue_repo
            .update_queue(
                queue.id,
                payload.name.as_deref(),
                payload.description.as_deref(),
                payload.event_name.as_deref(),
                payload.event_start_date,
                payload.event_end_date,
                payload.is_mobile_queue,
                payload.max_capacity,
                payload.estimated_service_time,
                payload.is_active,
            )
            .await?
            .ok_or(AppError::QueueNotFound)
    }

    /// Desativa (nunca deleta). Recusa enquanto houver clientes aguardando.
    pub async fn deactivate_queue(
        &self,
        organization_id: Uuid,
        queue_id: Uuid,
    ) -> Result<Queue, AppError> {
        let ctx = self
            .queue_repo
            .queue_context(queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;
        if ctx.organization_id != organization_id {
            return Err(AppError::QueueNotFound);
        }

        let waiting = self.queue_repo.count_waiting(&self.pool, queue_id).await?;
        if waiting > 0 {
            return Err(AppError::QueueHasWaitingCustomers);
        }

        self.queue_repo
            .deactivate(queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)
    }

    pub async fn queue_status(&self, queue_id: Uuid) -> Result<QueueStatusResponse, AppError> {
        let queue = self
            .queue_repo
            .find_by_id(queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;
        let waiting = self.queue_repo.count_waiting(&self.pool, queue_id).await?;

        Ok(QueueStatusResponse {
            queue_id: queue.id,
            name: queue.name,
            is_active: queue.is_active,
            waiting_customers: waiting,
            average_wait_time: estimate_wait_minutes(queue.estimated_service_time, waiting),
            is_accepting_customers: queue.is_active,
        })
    }

    pub async fn list_entries(
        &self,
        queue_id: Uuid,
        status: Option<EntryStatus>,
    ) -> Result<Vec<QueueEntry>, AppError> {
        self.queue_repo
            .find_by_id(queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;
        self.queue_repo.list_entries(queue_id, status).await
    }

    // ---
    // Ciclo de vida das entradas
    // ---

    /// Cliente entra na fila. A posição é atribuída com a linha da fila
    /// travada, então joins concorrentes não disputam o mesmo número.
    /// A notificação de boas-vindas é best-effort: falhar não desfaz o join.
    pub async fn join(
        &self,
        queue_id: Uuid,
        payload: &JoinQueuePayload,
    ) -> Result<EntryActionResponse, AppError> {
        if !payload.has_contact_info() {
            return Err(AppError::ContactInfoMissing);
        }

        let mut tx = self.pool.begin().await?;

        let queue = self
            .queue_repo
            .lock_queue(&mut *tx, queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;
        if !queue.is_active {
            return Err(AppError::QueueInactive);
        }

        if let Some(max_capacity) = queue.max_capacity {
            let waiting = self.queue_repo.count_waiting(&mut *tx, queue_id).await?;
            if waiting >= max_capacity as i64 {
                return Err(AppError::QueueFull);
            }
        }

        let entry = self
            .queue_repo
            .insert_entry(
                &mut *tx,
                queue_id,
                payload.customer_name.as_deref(),
                payload.customer_email.as_deref(),
                payload.customer_phone.as_deref(),
                payload.party_size,
                payload.notes.as_deref(),
            )
            .await?;

        tx.commit().await?;

        let notification = self
            .notify_entry(&queue, &entry, NotificationKind::QueueSubscription)
            .await;

        Ok(EntryActionResponse {
            entry,
            notification,
        })
    }

    /// Chama o próximo da fila (FIFO, menor posição WAITING).
    /// A transição é um comando atômico único; só DEPOIS dela confirmada a
    /// notificação é tentada. O cliente é considerado chamado mesmo que
    /// nenhum canal de notificação funcione.
    pub async fn call_next(&self, queue_id: Uuid) -> Result<EntryActionResponse, AppError> {
        let queue = self
            .queue_repo
            .find_by_id(queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;

        let entry = self
            .queue_repo
            .claim_next_waiting(queue_id)
            .await?
            .ok_or(AppError::EmptyQueue)?;

        tracing::info!(
            "📣 Cliente {} chamado na fila '{}' (posição {})",
            entry.display_name(),
            queue.name,
            entry.position
        );

        let notification = self
            .notify_entry(&queue, &entry, NotificationKind::NextInLine)
            .await;

        Ok(EntryActionResponse {
            entry,
            notification,
        })
    }

    pub async fn mark_served(&self, entry_id: Uuid) -> Result<QueueEntry, AppError> {
        self.transition(entry_id, EntryStatus::Served).await
    }

    pub async fn cancel(&self, entry_id: Uuid) -> Result<QueueEntry, AppError> {
        self.transition(entry_id, EntryStatus::Cancelled).await
    }

    pub async fn mark_no_show(&self, entry_id: Uuid) -> Result<QueueEntry, AppError> {
        self.transition(entry_id, EntryStatus::NoShow).await
    }

    async fn transition(&self, entry_id: Uuid, to: EntryStatus) -> Result<QueueEntry, AppError> {
        // Os estados de origem vêm da máquina de estados, não de listas
        // locais que poderiam divergir dela.
        let allowed_from = EntryStatus::sources_of(to);
        match self
            .queue_repo
            .transition_entry(entry_id, &allowed_from, to)
            .await?
        {
            Some(entry) => Ok(entry),
            // Distingue "não existe" de "existe mas não está elegível".
            None => match self.queue_repo.find_entry(entry_id).await? {
                Some(_) => Err(AppError::InvalidTransition),
                None => Err(AppError::EntryNotFound),
            },
        }
    }

    /// Lembrete "quase sua vez" para um cliente ainda aguardando
    /// (disparado manualmente pela equipe).
    pub async fn remind(&self, entry_id: Uuid) -> Result<EntryActionResponse, AppError> {
        let entry = self
            .queue_repo
            .find_entry(entry_id)
            .await?
            .ok_or(AppError::EntryNotFound)?;
        if entry.status != EntryStatus::Waiting {
            return Err(AppError::InvalidTransition);
        }
        let queue = self
            .queue_repo
            .find_by_id(entry.queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;

        let notification = self
            .notify_entry(&queue, &entry, NotificationKind::AlmostYourTurn)
            .await;

        Ok(EntryActionResponse {
            entry,
            notification,
        })
    }

    pub async fn entry_position(&self, entry_id: Uuid) -> Result<EntryPositionResponse, AppError> {
        let entry = self
            .queue_repo
            .find_entry(entry_id)
            .await?
            .ok_or(AppError::EntryNotFound)?;
        let queue = self
            .queue_repo
            .find_by_id(entry.queue_id)
            .await?
            .ok_or(AppError::QueueNotFound)?;

        let (position, ahead, estimated_wait, status_message) = match entry.status {
            EntryStatus::Waiting => {
                let ahead = self
                    .queue_repo
                    .waiting_ahead(entry.queue_id, entry.position)
                    .await?;
                let wait = estimate_wait_minutes(queue.estimated_service_time, ahead);
                let message = format!(
                    "You are #{} in line. {} people ahead of you.",
                    ahead + 1,
                    ahead
                );
                (Some(ahead + 1), Some(ahead), wait, message)
            }
            EntryStatus::Called => (
                None,
                None,
                Some(0),
                "You have been called! It's your turn - please proceed to the service area."
                    .to_string(),
            ),
            EntryStatus::Served => (
                None,
                None,
                None,
                "Your service has been completed. Thank you!".to_string(),
            ),
            EntryStatus::Cancelled => (
                None,
                None,
                None,
                "Your queue entry has been cancelled.".to_string(),
            ),
            EntryStatus::NoShow => (
                None,
                None,
                None,
                "You were called but did not respond. Your queue entry has been marked as no-show."
                    .to_string(),
            ),
        };

        Ok(EntryPositionResponse {
            entry_id: entry.id,
            queue_id: queue.id,
            queue_name: queue.name,
            status: entry.status,
            position,
            ahead_in_queue: ahead,
            estimated_wait_time: estimated_wait,
            status_message,
        })
    }

    // ---
    // Orquestração de notificação (SMS primeiro, fallback por e-mail)
    // ---

    /// Melhor esforço: tenta SMS se houver telefone E crédito; cai para
    /// e-mail se o SMS foi pulado ou falhou. Qualquer erro interno aqui é
    /// logado e vira parte do relatório, nunca um Err para o chamador.
    async fn notify_entry(
        &self,
        queue: &Queue,
        entry: &QueueEntry,
        kind: NotificationKind,
    ) -> NotificationReport {
        let ctx = match self.queue_repo.queue_context(queue.id).await {
            Ok(Some(ctx)) => ctx,
            Ok(None) => {
                tracing::warn!("Fila {} sem contexto de organização; notificação pulada", queue.id);
                return NotificationReport::empty();
            }
            Err(e) => {
                tracing::warn!("Falha ao carregar contexto da fila {}: {}", queue.id, e);
                return NotificationReport::empty();
            }
        };

        let customer_name = entry.display_name();

        // Posição e espera com base em quantos WAITING estão na frente.
        // A posição absoluta da entrada nunca diminui, então usá-la aqui
        // inflaria o número mostrado depois de atendimentos anteriores.
        let ahead = match self
            .queue_repo
            .waiting_ahead(entry.queue_id, entry.position)
            .await
        {
            Ok(ahead) => ahead,
            Err(e) => {
                tracing::warn!("Falha ao contar clientes à frente: {}", e);
                i64::from((entry.position - 1).max(0))
            }
        };
        let position = waiting_rank(ahead);
        let estimated_wait = format_wait(estimate_wait_minutes(queue.estimated_service_time, ahead));

        // 1. SMS: só com telefone, provedor e crédito. O débito acontece
        //    apenas após o envio confirmado.
        let quota = if entry.customer_phone.is_some() {
            match self.quota.check(ctx.organization_id).await {
                Ok(quota) => Some(quota),
                Err(e) => {
                    tracing::warn!("Falha ao consultar quota de SMS: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let mut sms_result: Option<DeliveryResult> = None;
        match plan_sms(entry.customer_phone.is_some(), quota.as_ref()) {
            SmsPlan::Skip => {}
            SmsPlan::RecordQuotaExceeded => {
                sms_result = Some(match quota {
                    Some(_) => DeliveryResult::failed("SMS quota exceeded"),
                    None => DeliveryResult::failed("quota check failed"),
                });
            }
            // O plano só escolhe Send com telefone presente.
            SmsPlan::Send => {
                if let Some(phone) = entry.customer_phone.as_deref() {
                    let body = match kind {
                        NotificationKind::QueueSubscription => templates::sms_queue_subscription(
                            customer_name,
                            &queue.name,
                            position,
                            &estimated_wait,
                        ),
                        NotificationKind::NextInLine => templates::sms_next_in_line(
                            customer_name,
                            &queue.name,
                            &ctx.location_name,
                        ),
                        NotificationKind::AlmostYourTurn => templates::sms_almost_your_turn(
                            customer_name,
                            &queue.name,
                            position,
                            &estimated_wait,
                        ),
                    };
                    let result = self.notifications.send_sms(phone, &body).await;
                    if result.success {
                        match self.quota.consume_sms_credit(ctx.organization_id).await {
                            Ok(true) => {}
                            Ok(false) => tracing::warn!(
                                "SMS enviado mas sem crédito para debitar (org {})",
                                ctx.organization_id
                            ),
                            Err(e) => tracing::warn!("Falha ao debitar crédito de SMS: {}", e),
                        }
                    }
                    sms_result = Some(result);
                }
            }
        }

        // 2. E-mail: fallback quando o SMS não saiu (ou nem foi tentado).
        let sms_delivered = sms_result.as_ref().is_some_and(|r| r.success);
        let mut email_result: Option<DeliveryResult> = None;
        if !sms_delivered {
            if let Some(email) = &entry.customer_email {
                let template = match kind {
                    NotificationKind::QueueSubscription => templates::email_queue_subscription(
                        customer_name,
                        &queue.name,
                        position,
                        &estimated_wait,
                    ),
                    NotificationKind::NextInLine => templates::email_next_in_line(
                        customer_name,
                        &queue.name,
                        &ctx.location_name,
                    ),
                    NotificationKind::AlmostYourTurn => templates::email_almost_your_turn(
                        customer_name,
                        &queue.name,
                        position,
                        &estimated_wait,
                    ),
                };
                let result = self.notifications.send_email(email, &template).await;
                if result.success {
                    if let Err(e) = self.quota.track_email_sent(ctx.organization_id).await {
                        tracing::warn!("Falha ao contabilizar e-mail enviado: {}", e);
                    }
                }
                email_result = Some(result);
            }
        }

        let outcome = delivery_outcome(sms_result.as_ref(), email_result.as_ref());
        if let Some(via) = outcome {
            if via == NotifiedVia::Unreachable {
                tracing::warn!(
                    "Cliente {} não pôde ser avisado por nenhum canal",
                    entry.display_name()
                );
            }
            if let Err(e) = self.queue_repo.set_notified_via(entry.id, via).await {
                tracing::warn!("Falha ao registrar canal de notificação: {}", e);
            }
        }

        NotificationReport {
            sms: sms_result,
            email: email_result,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok() -> DeliveryResult {
        DeliveryResult::sent(Some("msg-1".into()))
    }

    fn fail() -> DeliveryResult {
        DeliveryResult::failed("boom")
    }

    #[test]
    fn sms_entregue_vence() {
        assert_eq!(
            delivery_outcome(Some(&ok()), None),
            Some(NotifiedVia::Sms)
        );
        assert_eq!(
            delivery_outcome(Some(&ok()), Some(&ok())),
            Some(NotifiedVia::Sms)
        );
    }

    #[test]
    fn email_e_o_fallback() {
        assert_eq!(
            delivery_outcome(Some(&fail()), Some(&ok())),
            Some(NotifiedVia::Email)
        );
        assert_eq!(delivery_outcome(None, Some(&ok())), Some(NotifiedVia::Email));
    }

    #[test]
    fn ambos_falharam_vira_unreachable() {
        assert_eq!(
            delivery_outcome(Some(&fail()), Some(&fail())),
            Some(NotifiedVia::Unreachable)
        );
        assert_eq!(
            delivery_outcome(Some(&fail()), None),
            Some(NotifiedVia::Unreachable)
        );
    }

    #[test]
    fn nenhuma_tentativa_nao_registra_nada() {
        assert_eq!(delivery_outcome(None, None), None);
    }

    fn quota(remaining: i32) -> QuotaStatus {
        QuotaStatus {
            plan_type: crate::models::subscription::PlanType::Pro,
            total_credits: 100,
            used_credits: 100 - remaining,
            remaining_credits: remaining,
            can_send_sms: remaining > 0,
        }
    }

    #[test]
    fn sms_so_sai_com_telefone_e_credito() {
        assert_eq!(plan_sms(true, Some(&quota(5))), SmsPlan::Send);
        assert_eq!(plan_sms(false, Some(&quota(5))), SmsPlan::Skip);
    }

    #[test]
    fn quota_esgotada_nao_toca_a_rede() {
        // Sem crédito a falha entra no relatório direto, nenhum envio.
        assert_eq!(
            plan_sms(true, Some(&quota(0))),
            SmsPlan::RecordQuotaExceeded
        );
    }

    #[test]
    fn quota_indisponivel_e_tratada_como_esgotada() {
        assert_eq!(plan_sms(true, None), SmsPlan::RecordQuotaExceeded);
        assert_eq!(plan_sms(false, None), SmsPlan::Skip);
    }

    #[test]
    fn posicao_mostrada_conta_so_quem_espera_na_frente() {
        // Posição absoluta 43, mas apenas 2 WAITING na frente: cliente é o 3º.
        assert_eq!(waiting_rank(2), 3);
        assert_eq!(waiting_rank(0), 1);
    }

    #[test]
    fn espera_estimada_acompanha_a_posicao_real() {
        assert_eq!(estimate_wait_minutes(Some(10), 2), Some(20));
        assert_eq!(estimate_wait_minutes(None, 2), None);
    }
}
