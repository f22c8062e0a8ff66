// src/handlers/subscriptions.rs

use axum::{Json, extract::State};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{PermSubscriptionManage, PermSubscriptionRead, RequirePermission},
    },
    models::subscription::{QuotaStatus, Subscription},
};

// GET /api/subscriptions/sms-quota
#[utoipa::path(
    get,
    path = "/api/subscriptions/sms-quota",
    tag = "Subscriptions",
    responses((status = 200, description = "Quota de SMS da organização", body = QuotaStatus)),
    security(("api_jwt" = []))
)]
pub async fn sms_quota(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermSubscriptionRead>,
) -> Result<Json<QuotaStatus>, AppError> {
    let quota = app_state.quota_service.check(user.organization_id).await?;
    Ok(Json(quota))
}

// POST /api/subscriptions/renew: zera o uso e abre novo período
#[utoipa::path(
    post,
    path = "/api/subscriptions/renew",
    tag = "Subscriptions",
    responses((status = 200, description = "Período renovado", body = Subscription)),
    security(("api_jwt" = []))
)]
pub async fn renew_subscription(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _perm: RequirePermission<PermSubscriptionManage>,
) -> Result<Json<Subscription>, AppError> {
    let subscription = app_state
        .quota_service
        .renew_period(user.organization_id)
        .await?;
    Ok(Json(subscription))
}
