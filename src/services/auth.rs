// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::{codes::normalize_code, error::AppError},
    db::{InviteRepository, MembershipRepository, UserRepository},
    models::{
        auth::{AuthResponse, Claims, Session, User},
        membership::MemberRole,
    },
};

const TOKEN_TTL_DAYS: i64 = 7;

/// Hash em thread separada: bcrypt é caro e bloquearia o runtime.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let is_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(is_valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    membership_repo: MembershipRepository,
    invite_repo: InviteRepository,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        membership_repo: MembershipRepository,
        invite_repo: InviteRepository,
        jwt_secret: String,
    ) -> Self {
        Self { user_repo, membership_repo, invite_repo, jwt_secret }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        self.issue_session_token(&user).await
    }

    /// Troca um código de uso único (enviado por SMS) por um token.
    pub async fn login_with_magic_code(&self, code: &str) -> Result<AuthResponse, AppError> {
        let link = self
            .invite_repo
            .consume_magic_link(&normalize_code(code))
            .await?
            .ok_or(AppError::InvalidMagicCode)?;

        let user = self
            .user_repo
            .find_by_id(link.user_id)
            .await?
            .ok_or(AppError::InvalidMagicCode)?;

        self.issue_session_token(&user).await
    }

    pub async fn change_password(
        &self,
        user: &User,
        current_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), AppError> {
        // Com senha temporária ainda ativa não exigimos a atual
        if !user.must_change_password {
            let current = current_password.ok_or(AppError::InvalidCredentials)?;
            if !verify_password(current, &user.password_hash).await? {
                return Err(AppError::InvalidCredentials);
            }
        }

        let hashed = hash_password(new_password).await?;
        self.user_repo.set_password(user.id, &hashed, false).await
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.decode_token(token)?;

        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// As flags de papel que a interface usa.
    pub async fn session(&self, user: User) -> Result<Session, AppError> {
        let memberships = self.membership_repo.list_for_user(user.id).await?;

        let admin_customer_ids: Vec<_> = memberships
            .iter()
            .filter(|m| m.has_role(MemberRole::Admin))
            .map(|m| m.customer_id)
            .collect();
        let consumer_customer_ids: Vec<_> = memberships
            .iter()
            .filter(|m| m.has_role(MemberRole::User))
            .map(|m| m.customer_id)
            .collect();

        Ok(Session {
            is_system_owner: user.is_system_owner,
            is_customer_admin: !admin_customer_ids.is_empty(),
            is_consumer: !consumer_customer_ids.is_empty(),
            admin_customer_ids,
            consumer_customer_ids,
            user,
        })
    }

    async fn issue_session_token(&self, user: &User) -> Result<AuthResponse, AppError> {
        self.user_repo.touch_login(user.id).await?;
        tracing::info!(user_id = %user.id, "Login efetuado");

        Ok(AuthResponse {
            id_token: self.create_token(user)?,
            must_change_password: user.must_change_password,
        })
    }

    pub(crate) fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);

        let claims = Claims {
            sub: user.id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            sys: user.is_system_owner,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    pub(crate) fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service(secret: &str) -> AuthService {
        // Pool preguiçosa: nenhum teste aqui toca no banco
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/ikontroll_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            MembershipRepository::new(pool.clone()),
            InviteRepository::new(pool),
            secret.to_string(),
        )
    }

    fn user(is_system_owner: bool) -> User {
        User {
            id: Uuid::new_v4(),
            company_id: None,
            name: "Kari Nordmann".into(),
            email: Some("kari@example.no".into()),
            phone: None,
            password_hash: String::new(),
            is_system_owner,
            must_change_password: false,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn token_round_trip_keeps_subject_and_owner_flag() {
        let auth = service("segredo");
        let user = user(true);

        let token = auth.create_token(&user).unwrap();
        let claims = auth.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert!(claims.sys);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("um").create_token(&user(false)).unwrap();
        let err = service("outro").decode_token(&token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("hemmelig123").await.unwrap();
        assert!(verify_password("hemmelig123", &hashed).await.unwrap());
        assert!(!verify_password("feil", &hashed).await.unwrap());
    }
}
