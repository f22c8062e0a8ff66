// src/middleware/rbac.rs
//
// Checagem de capacidade feita UMA vez, na borda: o núcleo (services)
// recebe apenas ações já autorizadas. O conjunto de capacidades é
// derivado estaticamente do papel do usuário, sem consulta dinâmica
// espalhada pelos módulos.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use std::marker::PhantomData;

use crate::{common::error::ApiError, models::auth::User};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Extrai o usuário colocado pelo auth_guard
        let user = parts.extensions.get::<User>().ok_or(ApiError {
            status: StatusCode::UNAUTHORIZED,
            error: "Usuário não autenticado".into(),
            details: None,
        })?;

        // B. Verifica a capacidade no conjunto estático do papel
        let required_perm = T::slug();
        if !user.role.has_capability(required_perm) {
            return Err(ApiError {
                status: StatusCode::FORBIDDEN,
                error: format!(
                    "Você precisa da permissão '{}' para realizar esta ação.",
                    required_perm
                ),
                details: None,
            });
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermQueueRead;
impl PermissionDef for PermQueueRead {
    fn slug() -> &'static str {
        "queue:read"
    }
}

pub struct PermQueueManage;
impl PermissionDef for PermQueueManage {
    fn slug() -> &'static str {
        "queue:manage"
    }
}

pub struct PermQueueCall;
impl PermissionDef for PermQueueCall {
    fn slug() -> &'static str {
        "queue:call"
    }
}

pub struct PermTenancyManage;
impl PermissionDef for PermTenancyManage {
    fn slug() -> &'static str {
        "tenancy:manage"
    }
}

pub struct PermSubscriptionRead;
impl PermissionDef for PermSubscriptionRead {
    fn slug() -> &'static str {
        "subscription:read"
    }
}

pub struct PermSubscriptionManage;
impl PermissionDef for PermSubscriptionManage {
    fn slug() -> &'static str {
        "subscription:manage"
    }
}
