// src/handlers/registry.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::auth::AuthedJson,
    models::registry::{CompanySearchPayload, CompanySuggestion},
};

#[utoipa::path(
    post,
    path = "/api/internal/registry/search",
    tag = "Internal",
    request_body(content = CompanySearchPayload, description = "Mais o campo `idToken`. Nove dígitos buscam pelo org.nr."),
    responses(
        (status = 200, description = "Sugestões do Brønnøysundregistrene", body = Vec<CompanySuggestion>),
        (status = 502, description = "Registro indisponível")
    )
)]
pub async fn search_companies(
    State(app_state): State<AppState>,
    request: AuthedJson<CompanySearchPayload>,
) -> Result<Json<Vec<CompanySuggestion>>, ApiError> {
    let AuthedJson { user, locale, payload } = request;

    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(user_id = %user.id, query = %payload.query, "Busca no registro de empresas");

    let suggestions = app_state
        .registry_client
        .search(&payload.query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(suggestions))
}
