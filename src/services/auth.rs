// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SubscriptionRepository, TenancyRepository, UserRepository},
    models::auth::{Claims, User, UserRole},
    models::subscription::PlanType,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenancy_repo: TenancyRepository,
    subscription_repo: SubscriptionRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        tenancy_repo: TenancyRepository,
        subscription_repo: SubscriptionRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            tenancy_repo,
            subscription_repo,
            jwt_secret,
            pool,
        }
    }

    /// Onboarding: organização + usuário admin + assinatura FREE,
    /// tudo em uma transação só.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        organization_name: &str,
        name: Option<&str>,
    ) -> Result<String, AppError> {
        // 1. Hashing (fora da transação, não toca no banco)
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let mut tx = self.pool.begin().await?;

        // 2. Cria a organização
        let organization = self
            .tenancy_repo
            .create_organization(&mut *tx, organization_name)
            .await?;

        // 3. Cria o primeiro usuário como admin
        let new_user = self
            .user_repo
            .create_user(
                &mut *tx,
                organization.id,
                email,
                &hashed_password,
                name,
                UserRole::Admin,
            )
            .await?;

        // 4. Assinatura FREE de onboarding.
        // Se falhar aqui, organização e usuário sofrem rollback juntos.
        self.subscription_repo
            .create(&mut *tx, organization.id, PlanType::Free, None)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "🏢 Organização '{}' registrada com o usuário {}",
            organization.name,
            new_user.email
        );

        // 5. Gera o token (não precisa de transação)
        self.create_token(new_user.id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}
