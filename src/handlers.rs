pub mod auth;
pub mod queues;
pub mod subscriptions;
pub mod tenancy;

use axum::Json;
use serde_json::{Value, json};

// Health check simples, sem tocar no banco.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Serviço no ar"))
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
