// src/models/notification.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Canal pelo qual o cliente foi efetivamente avisado.
// UNREACHABLE é terminal: SMS e e-mail falharam e não há retentativa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "notified_via", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum NotifiedVia {
    Sms,
    Email,
    Unreachable,
}

// Resultado de um envio individual (um canal, um provedor).
// Erros de rede/provedor viram `success = false`, nunca sobem como exceção.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn sent(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

// Relatório agregado de uma tentativa de notificação (metadado da ação,
// nunca o sucesso/fracasso dela).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReport {
    pub sms: Option<DeliveryResult>,
    pub email: Option<DeliveryResult>,
    pub outcome: Option<NotifiedVia>,
}

impl NotificationReport {
    pub fn empty() -> Self {
        Self {
            sms: None,
            email: None,
            outcome: None,
        }
    }
}

// Tipo de notificação disparada por uma transição da fila.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationKind {
    QueueSubscription,
    NextInLine,
    AlmostYourTurn,
}
