// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Papel do usuário dentro da organização.
// As capacidades são derivadas daqui uma única vez, na borda (middleware/rbac.rs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Admin,
    Staff,
    Viewer,
}

impl UserRole {
    // Conjunto estático de capacidades por papel.
    pub fn capabilities(&self) -> &'static [&'static str] {
        match self {
            UserRole::Admin => &[
                "queue:read",
                "queue:manage",
                "queue:call",
                "tenancy:manage",
                "subscription:read",
                "subscription:manage",
            ],
            UserRole::Staff => &["queue:read", "queue:call"],
            UserRole::Viewer => &["queue:read"],
        }
    }

    pub fn has_capability(&self, slug: &str) -> bool {
        self.capabilities().contains(&slug)
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub name: Option<String>,
    pub role: UserRole,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para registro: cria a organização e o primeiro usuário (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(min = 2, message = "O nome da organização deve ter no mínimo 2 caracteres."))]
    pub organization_name: String,
    pub name: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_possui_todas_as_capacidades() {
        for slug in ["queue:manage", "queue:call", "subscription:manage"] {
            assert!(UserRole::Admin.has_capability(slug));
        }
    }

    #[test]
    fn staff_chama_mas_nao_gerencia() {
        assert!(UserRole::Staff.has_capability("queue:call"));
        assert!(UserRole::Staff.has_capability("queue:read"));
        assert!(!UserRole::Staff.has_capability("queue:manage"));
        assert!(!UserRole::Staff.has_capability("subscription:read"));
    }

    #[test]
    fn viewer_apenas_leitura() {
        assert_eq!(UserRole::Viewer.capabilities(), &["queue:read"]);
    }
}
