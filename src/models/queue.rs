// src/models/queue.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::notification::NotificationReport;

// --- ENUMS ---

// Mapeia o CREATE TYPE entry_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "entry_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Waiting,
    Called,
    Served,
    NoShow,
    Cancelled,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 5] = [
        EntryStatus::Waiting,
        EntryStatus::Called,
        EntryStatus::Served,
        EntryStatus::NoShow,
        EntryStatus::Cancelled,
    ];

    // SERVED, NO_SHOW e CANCELLED são estados finais: nenhuma transição sai deles.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EntryStatus::Served | EntryStatus::NoShow | EntryStatus::Cancelled
        )
    }

    // Máquina de estados da entrada:
    // WAITING -> CALLED -> SERVED | NO_SHOW
    // WAITING | CALLED -> CANCELLED
    pub fn can_transition_to(&self, next: EntryStatus) -> bool {
        match (self, next) {
            (EntryStatus::Waiting, EntryStatus::Called) => true,
            (EntryStatus::Waiting, EntryStatus::Cancelled) => true,
            (EntryStatus::Called, EntryStatus::Served) => true,
            (EntryStatus::Called, EntryStatus::NoShow) => true,
            (EntryStatus::Called, EntryStatus::Cancelled) => true,
            _ => false,
        }
    }

    /// Estados de origem que podem chegar em `to`, derivados da própria
    /// máquina de estados (fonte única da tabela de legalidade).
    pub fn sources_of(to: EntryStatus) -> Vec<EntryStatus> {
        Self::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(to))
            .collect()
    }
}

// --- FILA ---

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    pub service_id: Option<Uuid>,
    pub location_id: Uuid,

    // Filas de evento / móveis ("Festival de Amsterdã", etc.)
    pub event_name: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub is_mobile_queue: bool,

    pub max_capacity: Option<i32>,
    pub estimated_service_time: Option<i32>, // minutos por atendimento

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- ENTRADA NA FILA ---

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: Uuid,
    pub queue_id: Uuid,

    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,

    // Posição monotônica por fila, atribuída na ordem de entrada.
    pub position: i32,
    pub status: EntryStatus,
    pub party_size: i32,
    pub notes: Option<String>,

    pub notified_via: Option<crate::models::notification::NotifiedVia>,

    pub joined_at: DateTime<Utc>,
    pub called_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn display_name(&self) -> &str {
        self.customer_name.as_deref().unwrap_or("Cliente")
    }
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQueuePayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub name: String,
    pub description: Option<String>,

    pub service_id: Option<Uuid>,
    pub location_id: Uuid,

    pub event_name: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_mobile_queue: bool,

    #[validate(range(min = 1, message = "A capacidade máxima deve ser positiva."))]
    pub max_capacity: Option<i32>,
    #[validate(range(min = 1, message = "O tempo de atendimento deve ser positivo."))]
    pub estimated_service_time: Option<i32>,
}

impl CreateQueuePayload {
    // Campos de evento só fazem sentido juntos: se há data, há nome.
    pub fn has_orphan_event_fields(&self) -> bool {
        (self.event_start_date.is_some() || self.event_end_date.is_some())
            && self.event_name.is_none()
    }
}

// Atualização parcial: None = mantém o valor atual (não há como "desfazer"
// um campo, apenas sobrescrever).
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQueuePayload {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub name: Option<String>,
    pub description: Option<String>,

    pub event_name: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub is_mobile_queue: Option<bool>,

    #[validate(range(min = 1, message = "A capacidade máxima deve ser positiva."))]
    pub max_capacity: Option<i32>,
    #[validate(range(min = 1, message = "O tempo de atendimento deve ser positivo."))]
    pub estimated_service_time: Option<i32>,

    pub is_active: Option<bool>,
}

impl UpdateQueuePayload {
    // A mesma regra do create, aplicada ao resultado da mesclagem: depois
    // do update não pode sobrar data de evento sem nome de evento.
    pub fn leaves_orphan_event_fields(&self, current: &Queue) -> bool {
        let name = self.event_name.as_ref().or(current.event_name.as_ref());
        let start = self.event_start_date.or(current.event_start_date);
        let end = self.event_end_date.or(current.event_end_date);
        (start.is_some() || end.is_some()) && name.is_none()
    }
}

// Filtros de listagem de filas (query string). A ausência de todos
// significa "todas as filas da organização".
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct QueueListFilter {
    pub location_id: Option<Uuid>,
    pub event_name: Option<String>,
    #[serde(default)]
    pub mobile_only: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinQueuePayload {
    pub customer_name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    #[serde(default = "default_party_size")]
    #[validate(range(min = 1, message = "O tamanho do grupo deve ser positivo."))]
    pub party_size: i32,
    pub notes: Option<String>,
}

fn default_party_size() -> i32 {
    1
}

impl JoinQueuePayload {
    pub fn has_contact_info(&self) -> bool {
        self.customer_email.is_some() || self.customer_phone.is_some()
    }
}

// --- RESPOSTAS ---

// Resultado de entrar na fila / chamar o próximo: a entrada em si mais o
// relatório de notificação (metadado suplementar, nunca o sucesso da ação).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryActionResponse {
    #[serde(flatten)]
    pub entry: QueueEntry,
    pub notification: NotificationReport,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatusResponse {
    pub queue_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub waiting_customers: i64,
    pub average_wait_time: Option<i32>, // minutos
    pub is_accepting_customers: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryPositionResponse {
    pub entry_id: Uuid,
    pub queue_id: Uuid,
    pub queue_name: String,
    pub status: EntryStatus,
    pub position: Option<i64>,
    pub ahead_in_queue: Option<i64>,
    pub estimated_wait_time: Option<i32>, // minutos
    pub status_message: String,
}

// Estimativa de espera: tempo médio de atendimento * pessoas à frente.
pub fn estimate_wait_minutes(estimated_service_time: Option<i32>, ahead: i64) -> Option<i32> {
    let per_customer = estimated_service_time?;
    if ahead < 0 {
        return None;
    }
    Some(per_customer * ahead as i32)
}

pub fn format_wait(estimated_wait: Option<i32>) -> String {
    match estimated_wait {
        Some(minutes) => format!("{} minutes", minutes),
        None => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transicoes_validas_da_maquina_de_estados() {
        assert!(EntryStatus::Waiting.can_transition_to(EntryStatus::Called));
        assert!(EntryStatus::Waiting.can_transition_to(EntryStatus::Cancelled));
        assert!(EntryStatus::Called.can_transition_to(EntryStatus::Served));
        assert!(EntryStatus::Called.can_transition_to(EntryStatus::NoShow));
        assert!(EntryStatus::Called.can_transition_to(EntryStatus::Cancelled));
    }

    #[test]
    fn nenhuma_transicao_sai_de_estado_terminal() {
        let terminals = [
            EntryStatus::Served,
            EntryStatus::NoShow,
            EntryStatus::Cancelled,
        ];
        for from in terminals {
            assert!(from.is_terminal());
            for to in EntryStatus::ALL {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn origens_derivadas_da_maquina_de_estados() {
        assert_eq!(EntryStatus::sources_of(EntryStatus::Served), vec![EntryStatus::Called]);
        assert_eq!(EntryStatus::sources_of(EntryStatus::NoShow), vec![EntryStatus::Called]);
        assert_eq!(
            EntryStatus::sources_of(EntryStatus::Cancelled),
            vec![EntryStatus::Waiting, EntryStatus::Called]
        );
        assert_eq!(EntryStatus::sources_of(EntryStatus::Waiting), vec![]);
    }

    #[test]
    fn waiting_nao_pula_direto_para_served() {
        assert!(!EntryStatus::Waiting.can_transition_to(EntryStatus::Served));
        assert!(!EntryStatus::Waiting.can_transition_to(EntryStatus::NoShow));
    }

    #[test]
    fn estimativa_de_espera() {
        assert_eq!(estimate_wait_minutes(Some(10), 3), Some(30));
        assert_eq!(estimate_wait_minutes(Some(10), 0), Some(0));
        assert_eq!(estimate_wait_minutes(None, 3), None);
        assert_eq!(format_wait(Some(30)), "30 minutes");
        assert_eq!(format_wait(None), "Unknown");
    }

    #[test]
    fn campos_de_evento_orfaos_sao_detectados() {
        let payload = CreateQueuePayload {
            name: "Fila".into(),
            description: None,
            service_id: None,
            location_id: Uuid::new_v4(),
            event_name: None,
            event_start_date: Some(chrono::Utc::now()),
            event_end_date: None,
            is_mobile_queue: false,
            max_capacity: None,
            estimated_service_time: None,
        };
        assert!(payload.has_orphan_event_fields());
    }

    fn fila(event_name: Option<&str>, event_start: Option<DateTime<Utc>>) -> Queue {
        let now = chrono::Utc::now();
        Queue {
            id: Uuid::new_v4(),
            name: "Fila".into(),
            description: None,
            service_id: None,
            location_id: Uuid::new_v4(),
            event_name: event_name.map(str::to_string),
            event_start_date: event_start,
            event_end_date: None,
            is_mobile_queue: false,
            max_capacity: None,
            estimated_service_time: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn update_nao_pode_deixar_data_de_evento_sem_nome() {
        // Fila sem evento; update adiciona só a data.
        let payload = UpdateQueuePayload {
            event_start_date: Some(chrono::Utc::now()),
            ..Default::default()
        };
        assert!(payload.leaves_orphan_event_fields(&fila(None, None)));

        // A mesma mesclagem com nome já existente na fila é válida.
        assert!(!payload.leaves_orphan_event_fields(&fila(Some("Festival"), None)));

        // Update que traz nome junto com a data também é válido.
        let payload = UpdateQueuePayload {
            event_name: Some("Festival".into()),
            event_start_date: Some(chrono::Utc::now()),
            ..Default::default()
        };
        assert!(!payload.leaves_orphan_event_fields(&fila(None, None)));
    }

    #[test]
    fn update_vazio_preserva_evento_existente() {
        let payload = UpdateQueuePayload::default();
        assert!(!payload.leaves_orphan_event_fields(&fila(
            Some("Festival"),
            Some(chrono::Utc::now())
        )));
        assert!(!payload.leaves_orphan_event_fields(&fila(None, None)));
    }
}
