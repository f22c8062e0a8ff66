// src/db/queue_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        notification::NotifiedVia,
        queue::{EntryStatus, Queue, QueueEntry},
    },
};

// Contexto de uma fila para notificações: de quem ela é e onde fica.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueContext {
    pub organization_id: Uuid,
    pub location_name: String,
}

#[derive(Clone)]
pub struct QueueRepository {
    pool: PgPool,
}

impl QueueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Filas
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create_queue(
        &self,
        name: &str,
        description: Option<&str>,
        service_id: Option<Uuid>,
        location_id: Uuid,
        event_name: Option<&str>,
        event_start_date: Option<DateTime<Utc>>,
        event_end_date: Option<DateTime<Utc>>,
        is_mobile_queue: bool,
        max_capacity: Option<i32>,
        estimated_service_time: Option<i32>,
    ) -> Result<Queue, AppError> {
        let queue = sqlx::query_as::<_, Queue>(
            r#"
            INSERT INTO queues
                (name, description, service_id, location_id, event_name,
                 event_start_date, event_end_date, is_mobile_queue,
                 max_capacity, estimated_service_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(service_id)
        .bind(location_id)
        .bind(event_name)
        .bind(event_start_date)
        .bind(event_end_date)
        .bind(is_mobile_queue)
        .bind(max_capacity)
        .bind(estimated_service_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(queue)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Queue>, AppError> {
        let queue = sqlx::query_as::<_, Queue>("SELECT * FROM queues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(queue)
    }

    /// Trava a linha da fila durante a transação de entrada (join).
    /// Serializa a atribuição de posição contra joins concorrentes.
    pub async fn lock_queue<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Queue>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let queue = sqlx::query_as::<_, Queue>("SELECT * FROM queues WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(queue)
    }

    /// De quem é a fila e onde ela fica (para quota e templates).
    pub async fn queue_context(&self, queue_id: Uuid) -> Result<Option<QueueContext>, AppError> {
        let ctx = sqlx::query_as::<_, QueueContext>(
            r#"
            SELECT l.organization_id, l.name AS location_name
            FROM queues q
            JOIN locations l ON l.id = q.location_id
            WHERE q.id = $1
            "#,
        )
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ctx)
    }

    pub async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Queue>, AppError> {
        let queues = sqlx::query_as::<_, Queue>(
            r#"
            SELECT q.* FROM queues q
            JOIN locations l ON l.id = q.location_id
            WHERE l.organization_id = $1 AND q.is_active = TRUE
            ORDER BY q.name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(queues)
    }

    pub async fn list_by_location(&self, location_id: Uuid) -> Result<Vec<Queue>, AppError> {
        let queues = sqlx::query_as::<_, Queue>(
            "SELECT * FROM queues WHERE location_id = $1 AND is_active = TRUE ORDER BY name ASC",
        )
        .bind(location_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(queues)
    }

    pub async fn list_by_event(&self, event_name: &str) -> Result<Vec<Queue>, AppError> {
        let queues = sqlx::query_as::<_, Queue>(
            "SELECT * FROM queues WHERE event_name = $1 AND is_active = TRUE ORDER BY name ASC",
        )
        .bind(event_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(queues)
    }

    pub async fn list_mobile_queues(&self) -> Result<Vec<Queue>, AppError> {
        let queues = sqlx::query_as::<_, Queue>(
            "SELECT * FROM queues WHERE is_mobile_queue = TRUE AND is_active = TRUE ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(queues)
    }

    pub async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Queue>, AppError> {
        let queues = sqlx::query_as::<_, Queue>(
            r#"
            SELECT * FROM queues
            WHERE event_start_date <= $2 AND event_end_date >= $1 AND is_active = TRUE
            ORDER BY event_start_date ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(queues)
    }

    pub async fn count_active_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM queues q
            JOIN locations l ON l.id = q.location_id
            WHERE l.organization_id = $1 AND q.is_active = TRUE
            "#,
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Atualização parcial: NULL em um parâmetro mantém o valor atual.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_queue(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        event_name: Option<&str>,
        event_start_date: Option<DateTime<Utc>>,
        event_end_date: Option<DateTime<Utc>>,
        is_mobile_queue: Option<bool>,
        max_capacity: Option<i32>,
        estimated_service_time: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<Option<Queue>, AppError> {
        let queue = sqlx::query_as::<_, Queue>(
            r#"
            UPDATE queues
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                event_name = COALESCE($4, event_name),
                event_start_date = COALESCE($5, event_start_date),
                event_end_date = COALESCE($6, event_end_date),
                is_mobile_queue = COALESCE($7, is_mobile_queue),
                max_capacity = COALESCE($8, max_capacity),
                estimated_service_time = COALESCE($9, estimated_service_time),
                is_active = COALESCE($10, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(event_name)
        .bind(event_start_date)
        .bind(event_end_date)
        .bind(is_mobile_queue)
        .bind(max_capacity)
        .bind(estimated_service_time)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(queue)
    }

    /// Desativa em vez de deletar: o histórico de entradas é preservado.
    pub async fn deactivate(&self, id: Uuid) -> Result<Option<Queue>, AppError> {
        let queue = sqlx::query_as::<_, Queue>(
            "UPDATE queues SET is_active = FALSE, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(queue)
    }

    // ---
    // Entradas de fila
    // ---

    pub async fn count_waiting<'e, E>(&self, executor: E, queue_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM queue_entries WHERE queue_id = $1 AND status = 'WAITING'",
        )
        .bind(queue_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Insere a entrada com a próxima posição da fila.
    /// Roda na transação de join, com a linha da fila travada: o MAX(position)
    /// não corre contra outros joins da mesma fila.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_entry<'e, E>(
        &self,
        executor: E,
        queue_id: Uuid,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
        customer_phone: Option<&str>,
        party_size: i32,
        notes: Option<&str>,
    ) -> Result<QueueEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, QueueEntry>(
            r#"
            INSERT INTO queue_entries
                (queue_id, customer_name, customer_email, customer_phone,
                 party_size, notes, position)
            SELECT $1, $2, $3, $4, $5, $6,
                   COALESCE(MAX(position), 0) + 1
            FROM queue_entries WHERE queue_id = $1
            RETURNING *
            "#,
        )
        .bind(queue_id)
        .bind(customer_name)
        .bind(customer_email)
        .bind(customer_phone)
        .bind(party_size)
        .bind(notes)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    pub async fn find_entry(&self, id: Uuid) -> Result<Option<QueueEntry>, AppError> {
        let entry = sqlx::query_as::<_, QueueEntry>("SELECT * FROM queue_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(entry)
    }

    pub async fn list_entries(
        &self,
        queue_id: Uuid,
        status: Option<EntryStatus>,
    ) -> Result<Vec<QueueEntry>, AppError> {
        let entries = match status {
            Some(status) => {
                sqlx::query_as::<_, QueueEntry>(
                    "SELECT * FROM queue_entries WHERE queue_id = $1 AND status = $2 ORDER BY position ASC",
                )
                .bind(queue_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, QueueEntry>(
                    "SELECT * FROM queue_entries WHERE queue_id = $1 ORDER BY position ASC",
                )
                .bind(queue_id)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(entries)
    }

    /// Quantos aguardando na frente desta posição.
    pub async fn waiting_ahead(&self, queue_id: Uuid, position: i32) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM queue_entries
            WHERE queue_id = $1 AND status = 'WAITING' AND position < $2
            "#,
        )
        .bind(queue_id)
        .bind(position)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Reivindica o próximo WAITING de menor posição em um único comando:
    /// o FOR UPDATE SKIP LOCKED serializa dois atendentes chamando ao mesmo
    /// tempo: cada um leva uma entrada distinta ou recebe fila vazia.
    pub async fn claim_next_waiting(&self, queue_id: Uuid) -> Result<Option<QueueEntry>, AppError> {
        let entry = sqlx::query_as::<_, QueueEntry>(
            r#"
            UPDATE queue_entries
            SET status = 'CALLED', called_at = now(), updated_at = now()
            WHERE id = (
                SELECT id FROM queue_entries
                WHERE queue_id = $1 AND status = 'WAITING'
                ORDER BY position ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(queue_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Transição condicional em um único comando: só muda se o status atual
    /// estiver na lista permitida. None = a entrada não estava elegível.
    pub async fn transition_entry(
        &self,
        id: Uuid,
        allowed_from: &[EntryStatus],
        to: EntryStatus,
    ) -> Result<Option<QueueEntry>, AppError> {
        let entry = sqlx::query_as::<_, QueueEntry>(
            r#"
            UPDATE queue_entries
            SET status = $2, completed_at = now(), updated_at = now()
            WHERE id = $1 AND status = ANY($3)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(to)
        .bind(allowed_from)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Registra por qual canal o cliente foi avisado (ou UNREACHABLE).
    pub async fn set_notified_via(
        &self,
        entry_id: Uuid,
        via: NotifiedVia,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE queue_entries SET notified_via = $2, updated_at = now() WHERE id = $1")
            .bind(entry_id)
            .bind(via)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
