// src/handlers/tenancy.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermTenancyManage, RequirePermission},
    },
    models::tenancy::{CreateLocationPayload, CreateServicePayload, Location, Service},
};

// ---
// LOCAIS
// ---

// POST /api/locations
#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "Tenancy",
    request_body = CreateLocationPayload,
    responses((status = 201, description = "Local criado", body = Location)),
    security(("api_jwt" = []))
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermTenancyManage>,
    Json(payload): Json<CreateLocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let location = app_state
        .tenancy_repo
        .create_location(
            user.organization_id,
            &payload.name,
            payload.address.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(location)))
}

// GET /api/locations
#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Tenancy",
    responses((status = 200, description = "Locais da organização", body = [Location])),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Location>>, AppError> {
    let locations = app_state
        .tenancy_repo
        .list_locations(user.organization_id)
        .await?;
    Ok(Json(locations))
}

// ---
// SERVIÇOS (catálogo global)
// ---

// POST /api/services
#[utoipa::path(
    post,
    path = "/api/services",
    tag = "Tenancy",
    request_body = CreateServicePayload,
    responses((status = 201, description = "Serviço criado", body = Service)),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    _perm: RequirePermission<PermTenancyManage>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let service = app_state
        .tenancy_repo
        .create_service(&payload.name, payload.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(service)))
}

// GET /api/services
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Tenancy",
    responses((status = 200, description = "Catálogo de serviços", body = [Service])),
    security(("api_jwt" = []))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = app_state.tenancy_repo.list_services().await?;
    Ok(Json(services))
}
