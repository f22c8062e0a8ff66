// src/handlers/queues.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermQueueCall, PermQueueManage, PermQueueRead, RequirePermission},
    },
    models::queue::{
        CreateQueuePayload, EntryActionResponse, EntryPositionResponse, EntryStatus,
        JoinQueuePayload, Queue, QueueEntry, QueueListFilter, QueueStatusResponse,
        UpdateQueuePayload,
    },
};

// ---
// FILAS (staff)
// ---

// POST /api/queues
#[utoipa::path(
    post,
    path = "/api/queues",
    tag = "Queues",
    request_body = CreateQueuePayload,
    responses(
        (status = 201, description = "Fila criada", body = Queue),
        (status = 403, description = "Limite de filas do plano atingido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_queue(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermQueueManage>,
    Json(payload): Json<CreateQueuePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let queue = app_state
        .queue_service
        .create_queue(user.organization_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(queue)))
}

// GET /api/queues
#[utoipa::path(
    get,
    path = "/api/queues",
    tag = "Queues",
    params(QueueListFilter),
    responses((status = 200, description = "Filas encontradas", body = [Queue])),
    security(("api_jwt" = []))
)]
pub async fn list_queues(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermQueueRead>,
    Query(filter): Query<QueueListFilter>,
) -> Result<Json<Vec<Queue>>, AppError> {
    let queues = app_state
        .queue_service
        .list_queues(user.organization_id, &filter)
        .await?;
    Ok(Json(queues))
}

// GET /api/queues/{id}
#[utoipa::path(
    get,
    path = "/api/queues/{id}",
    tag = "Queues",
    params(("id" = Uuid, Path, description = "ID da fila")),
    responses(
        (status = 200, description = "Fila encontrada", body = Queue),
        (status = 404, description = "Fila não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_queue(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermQueueRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Queue>, AppError> {
    let queue = app_state
        .queue_service
        .get_queue(user.organization_id, id)
        .await?;
    Ok(Json(queue))
}

// PATCH /api/queues/{id}: atualização parcial, campos ausentes ficam como estão
#[utoipa::path(
    patch,
    path = "/api/queues/{id}",
    tag = "Queues",
    params(("id" = Uuid, Path, description = "ID da fila")),
    request_body = UpdateQueuePayload,
    responses(
        (status = 200, description = "Fila atualizada", body = Queue),
        (status = 400, description = "Datas de evento sem nome de evento"),
        (status = 404, description = "Fila não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_queue(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermQueueManage>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQueuePayload>,
) -> Result<Json<Queue>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let queue = app_state
        .queue_service
        .update_queue(user.organization_id, id, &payload)
        .await?;
    Ok(Json(queue))
}

// DELETE /api/queues/{id} (soft delete: desativa)
#[utoipa::path(
    delete,
    path = "/api/queues/{id}",
    tag = "Queues",
    params(("id" = Uuid, Path, description = "ID da fila")),
    responses(
        (status = 200, description = "Fila desativada", body = Queue),
        (status = 400, description = "Fila ainda possui clientes aguardando")
    ),
    security(("api_jwt" = []))
)]
pub async fn deactivate_queue(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermQueueManage>,
    Path(id): Path<Uuid>,
) -> Result<Json<Queue>, AppError> {
    let queue = app_state
        .queue_service
        .deactivate_queue(user.organization_id, id)
        .await?;
    Ok(Json(queue))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct EntriesQuery {
    pub status: Option<EntryStatus>,
}

// GET /api/queues/{id}/entries
#[utoipa::path(
    get,
    path = "/api/queues/{id}/entries",
    tag = "Queues",
    params(
        ("id" = Uuid, Path, description = "ID da fila"),
        EntriesQuery
    ),
    responses((status = 200, description = "Entradas da fila", body = [QueueEntry])),
    security(("api_jwt" = []))
)]
pub async fn list_entries(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermQueueRead>,
    Path(id): Path<Uuid>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<QueueEntry>>, AppError> {
    let entries = app_state.queue_service.list_entries(id, query.status).await?;
    Ok(Json(entries))
}

// POST /api/queues/{id}/call-next
#[utoipa::path(
    post,
    path = "/api/queues/{id}/call-next",
    tag = "Queues",
    params(("id" = Uuid, Path, description = "ID da fila")),
    responses(
        (status = 200, description = "Próximo cliente chamado", body = EntryActionResponse),
        (status = 404, description = "Fila vazia ou inexistente")
    ),
    security(("api_jwt" = []))
)]
pub async fn call_next(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermQueueCall>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryActionResponse>, AppError> {
    let response = app_state.queue_service.call_next(id).await?;
    Ok(Json(response))
}

// ---
// ENTRADAS (staff)
// ---

// POST /api/entries/{id}/serve
#[utoipa::path(
    post,
    path = "/api/entries/{id}/serve",
    tag = "Entries",
    params(("id" = Uuid, Path, description = "ID da entrada")),
    responses(
        (status = 200, description = "Atendimento concluído", body = QueueEntry),
        (status = 409, description = "Entrada não está em CALLED")
    ),
    security(("api_jwt" = []))
)]
pub async fn serve_entry(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermQueueCall>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueueEntry>, AppError> {
    let entry = app_state.queue_service.mark_served(id).await?;
    Ok(Json(entry))
}

// POST /api/entries/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/entries/{id}/cancel",
    tag = "Entries",
    params(("id" = Uuid, Path, description = "ID da entrada")),
    responses(
        (status = 200, description = "Entrada cancelada", body = QueueEntry),
        (status = 409, description = "Entrada já está em estado final")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_entry(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermQueueCall>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueueEntry>, AppError> {
    let entry = app_state.queue_service.cancel(id).await?;
    Ok(Json(entry))
}

// POST /api/entries/{id}/no-show
#[utoipa::path(
    post,
    path = "/api/entries/{id}/no-show",
    tag = "Entries",
    params(("id" = Uuid, Path, description = "ID da entrada")),
    responses(
        (status = 200, description = "Cliente marcado como no-show", body = QueueEntry),
        (status = 409, description = "Entrada não está em CALLED")
    ),
    security(("api_jwt" = []))
)]
pub async fn no_show_entry(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermQueueCall>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueueEntry>, AppError> {
    let entry = app_state.queue_service.mark_no_show(id).await?;
    Ok(Json(entry))
}

// POST /api/entries/{id}/remind: lembrete "quase sua vez"
#[utoipa::path(
    post,
    path = "/api/entries/{id}/remind",
    tag = "Entries",
    params(("id" = Uuid, Path, description = "ID da entrada")),
    responses(
        (status = 200, description = "Lembrete enviado", body = EntryActionResponse),
        (status = 409, description = "Entrada não está em WAITING")
    ),
    security(("api_jwt" = []))
)]
pub async fn remind_entry(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermQueueCall>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryActionResponse>, AppError> {
    let response = app_state.queue_service.remind(id).await?;
    Ok(Json(response))
}

// ---
// ROTAS PÚBLICAS (cliente final, sem autenticação)
// ---

// POST /api/public/queues/{id}/join
#[utoipa::path(
    post,
    path = "/api/public/queues/{id}/join",
    tag = "Public",
    params(("id" = Uuid, Path, description = "ID da fila")),
    request_body = JoinQueuePayload,
    responses(
        (status = 201, description = "Cliente entrou na fila", body = EntryActionResponse),
        (status = 400, description = "Sem contato, fila inativa ou cheia")
    )
)]
pub async fn join_queue(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinQueuePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state.queue_service.join(id, &payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/public/queues/{id}/status
#[utoipa::path(
    get,
    path = "/api/public/queues/{id}/status",
    tag = "Public",
    params(("id" = Uuid, Path, description = "ID da fila")),
    responses((status = 200, description = "Status da fila", body = QueueStatusResponse))
)]
pub async fn queue_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QueueStatusResponse>, AppError> {
    let status = app_state.queue_service.queue_status(id).await?;
    Ok(Json(status))
}

// GET /api/public/entries/{id}/position
#[utoipa::path(
    get,
    path = "/api/public/entries/{id}/position",
    tag = "Public",
    params(("id" = Uuid, Path, description = "ID da entrada")),
    responses((status = 200, description = "Posição do cliente", body = EntryPositionResponse))
)]
pub async fn entry_position(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EntryPositionResponse>, AppError> {
    let position = app_state.queue_service.entry_position(id).await?;
    Ok(Json(position))
}
