// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Erros de notificação (quota/provedor) NÃO aparecem aqui de propósito:
// eles são engolidos no QueueService e viram metadado da resposta.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("É necessário informar e-mail ou telefone")]
    ContactInfoMissing,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Fila não encontrada")]
    QueueNotFound,

    #[error("Entrada de fila não encontrada")]
    EntryNotFound,

    #[error("Local não encontrado")]
    LocationNotFound,

    #[error("Serviço não encontrado")]
    ServiceNotFound,

    #[error("Campos de evento exigem event_name")]
    EventNameRequired,

    #[error("A fila não está aceitando novos clientes")]
    QueueInactive,

    #[error("A fila atingiu a capacidade máxima")]
    QueueFull,

    #[error("A fila ainda possui clientes aguardando")]
    QueueHasWaitingCustomers,

    #[error("Limite de filas do plano atingido ({0})")]
    QueueLimitReached(i32),

    #[error("Não há clientes aguardando nesta fila")]
    EmptyQueue,

    #[error("Transição de status inválida")]
    InvalidTransition,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ContactInfoMissing => (
                StatusCode::BAD_REQUEST,
                "Informe um e-mail ou um telefone para entrar na fila.".to_string(),
            ),
            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "E-mail ou senha inválidos.".to_string(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string())
            }
            AppError::QueueNotFound => {
                (StatusCode::NOT_FOUND, "Fila não encontrada.".to_string())
            }
            AppError::EntryNotFound => (
                StatusCode::NOT_FOUND,
                "Entrada de fila não encontrada.".to_string(),
            ),
            AppError::LocationNotFound => {
                (StatusCode::NOT_FOUND, "Local não encontrado.".to_string())
            }
            AppError::ServiceNotFound => {
                (StatusCode::NOT_FOUND, "Serviço não encontrado.".to_string())
            }
            AppError::EventNameRequired => (
                StatusCode::BAD_REQUEST,
                "Datas de evento exigem um nome de evento.".to_string(),
            ),
            AppError::QueueInactive => (
                StatusCode::BAD_REQUEST,
                "A fila não está aceitando novos clientes.".to_string(),
            ),
            AppError::QueueFull => (
                StatusCode::BAD_REQUEST,
                "A fila atingiu a capacidade máxima.".to_string(),
            ),
            AppError::QueueHasWaitingCustomers => (
                StatusCode::BAD_REQUEST,
                "Não é possível desativar uma fila com clientes aguardando.".to_string(),
            ),
            AppError::QueueLimitReached(limit) => (
                StatusCode::FORBIDDEN,
                format!("Seu plano permite no máximo {} fila(s) ativa(s).", limit),
            ),
            AppError::EmptyQueue => (
                StatusCode::NOT_FOUND,
                "Não há clientes aguardando nesta fila.".to_string(),
            ),
            AppError::InvalidTransition => (
                StatusCode::CONFLICT,
                "A entrada não está em um status que permita esta ação.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

// Erro "pronto para a API", usado pelos extractors (rejeições de middleware).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => Json(json!({ "error": self.error, "details": details })),
            None => Json(json!({ "error": self.error })),
        };
        (self.status, body).into_response()
    }
}
