// src/handlers/users.rs
//
// Provisionamento de usuários. Rotas internas: o `idToken` vem no corpo.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::auth::AuthedJson,
    models::membership::{
        CreateUserPayload, CustomerUser, DeleteUserPayload, DeleteUserResponse, ProvisionedUser, UpdateUserPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/internal/users/create",
    tag = "Internal",
    request_body(content = CreateUserPayload, description = "Mais o campo `idToken`"),
    responses(
        (status = 201, description = "Usuário criado ou ligado ao cliente", body = ProvisionedUser),
        (status = 403, description = "Apenas admins do cliente")
    )
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    request: AuthedJson<CreateUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let AuthedJson { user, locale, payload } = request;

    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let provisioned = app_state
        .user_service
        .create_user(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(provisioned)))
}

#[utoipa::path(
    post,
    path = "/api/internal/users/update",
    tag = "Internal",
    request_body(content = UpdateUserPayload, description = "Mais o campo `idToken`"),
    responses(
        (status = 200, description = "Usuário atualizado", body = CustomerUser),
        (status = 404, description = "Usuário não pertence ao cliente")
    )
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    request: AuthedJson<UpdateUserPayload>,
) -> Result<Json<CustomerUser>, ApiError> {
    let AuthedJson { user, locale, payload } = request;

    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .user_service
        .update_user(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

#[utoipa::path(
    post,
    path = "/api/internal/users/delete",
    tag = "Internal",
    request_body(content = DeleteUserPayload, description = "Mais o campo `idToken`"),
    responses(
        (status = 200, description = "Registro removido; usuário removido se ficou sem clientes", body = DeleteUserResponse),
        (status = 403, description = "Não é possível remover a si mesmo")
    )
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    request: AuthedJson<DeleteUserPayload>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    let AuthedJson { user, locale, payload } = request;

    let outcome = app_state
        .user_service
        .delete_user(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(outcome))
}
