// src/middleware/auth.rs

use axum::{
    extract::{FromRequest, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

// Guard das rotas normais: token no cabeçalho `Authorization: Bearer`.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| to_api(AppError::InvalidToken))?;

    let user = app_state
        .auth_service
        .validate_token(bearer.token())
        .await
        .map_err(to_api)?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

// ---
// Rotas internas: o token vem no próprio corpo JSON, como `idToken`,
// ao lado dos campos do payload.
// ---
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenEnvelope<T> {
    id_token: String,
    #[serde(flatten)]
    payload: T,
}

pub struct AuthedJson<T> {
    pub user: User,
    pub locale: Locale,
    pub payload: T,
}

impl<T> FromRequest<AppState> for AuthedJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = request.into_parts();
        let locale = Locale::from_request_parts(&mut parts, state)
            .await
            .unwrap_or_default();
        let request = Request::from_parts(parts, body);

        let Json(envelope) = Json::<TokenEnvelope<T>>::from_request(request, state)
            .await
            .map_err(|rejection| {
                AppError::InvalidInput(rejection.body_text()).to_api_error(&locale, &state.i18n_store)
            })?;

        if envelope.id_token.trim().is_empty() {
            return Err(AppError::InvalidToken.to_api_error(&locale, &state.i18n_store));
        }

        let user = state
            .auth_service
            .validate_token(&envelope.id_token)
            .await
            .map_err(|e| e.to_api_error(&locale, &state.i18n_store))?;

        Ok(AuthedJson { user, locale, payload: envelope.payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        customer_id: Uuid,
        name: String,
    }

    #[test]
    fn envelope_splits_token_from_payload() {
        let customer_id = Uuid::new_v4();
        let envelope: TokenEnvelope<Payload> = serde_json::from_value(json!({
            "idToken": "abc.def.ghi",
            "customerId": customer_id,
            "name": "Kari"
        }))
        .unwrap();

        assert_eq!(envelope.id_token, "abc.def.ghi");
        assert_eq!(envelope.payload.customer_id, customer_id);
        assert_eq!(envelope.payload.name, "Kari");
    }

    #[test]
    fn envelope_without_token_is_rejected() {
        let result: Result<TokenEnvelope<Payload>, _> =
            serde_json::from_value(json!({"customerId": Uuid::new_v4(), "name": "Kari"}));
        assert!(result.is_err());
    }
}
