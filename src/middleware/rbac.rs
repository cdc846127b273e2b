// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::User,
};

/// 1. O Trait que define um papel global exigido pela rota
pub trait RoleDef: Send + Sync + 'static {
    fn allows(user: &User) -> bool;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state).await.unwrap_or_default();

        // A. Extrai Usuário (inserido pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Verifica o papel
        if !T::allows(&user.0) {
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct SystemOwner;
impl RoleDef for SystemOwner {
    fn allows(user: &User) -> bool {
        user.is_system_owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(is_system_owner: bool) -> User {
        User {
            id: Uuid::new_v4(),
            company_id: None,
            name: "Ola".into(),
            email: None,
            phone: Some("+4791234567".into()),
            password_hash: String::new(),
            is_system_owner,
            must_change_password: false,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_system_owners_pass() {
        assert!(SystemOwner::allows(&user(true)));
        assert!(!SystemOwner::allows(&user(false)));
    }
}
