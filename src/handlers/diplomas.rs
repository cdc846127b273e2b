// src/handlers/diplomas.rs

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{AuthedJson, AuthenticatedUser},
        i18n::Locale,
    },
    models::diploma::{DiplomaRequest, DiplomaTemplate, DiplomaTemplatePayload},
};

#[utoipa::path(
    post,
    path = "/api/diploma-templates",
    tag = "Diplomas",
    request_body = DiplomaTemplatePayload,
    responses(
        (status = 201, description = "Modelo criado", body = DiplomaTemplate)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<DiplomaTemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let template = app_state
        .diploma_service
        .create_template(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(template)))
}

#[utoipa::path(
    get,
    path = "/api/diploma-templates/{id}",
    tag = "Diplomas",
    params(("id" = Uuid, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Modelo", body = DiplomaTemplate),
        (status = 404, description = "Modelo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DiplomaTemplate>, ApiError> {
    let template = app_state
        .diploma_service
        .get_template(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(template))
}

#[utoipa::path(
    put,
    path = "/api/diploma-templates/{id}",
    tag = "Diplomas",
    request_body = DiplomaTemplatePayload,
    params(("id" = Uuid, Path, description = "ID do modelo")),
    responses(
        (status = 200, description = "Modelo atualizado", body = DiplomaTemplate)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DiplomaTemplatePayload>,
) -> Result<Json<DiplomaTemplate>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let template = app_state
        .diploma_service
        .update_template(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(template))
}

#[utoipa::path(
    delete,
    path = "/api/diploma-templates/{id}",
    tag = "Diplomas",
    params(("id" = Uuid, Path, description = "ID do modelo")),
    responses(
        (status = 204, description = "Modelo removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_template(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .diploma_service
        .delete_template(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/internal/diplomas",
    tag = "Internal",
    request_body(content = DiplomaRequest, description = "Mais o campo `idToken`"),
    responses(
        (status = 200, description = "Diploma em PDF", content_type = "application/pdf"),
        (status = 409, description = "Curso ainda não concluído")
    )
)]
pub async fn generate_diploma(
    State(app_state): State<AppState>,
    request: AuthedJson<DiplomaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let AuthedJson { user, locale, payload } = request;

    let pdf_bytes = app_state
        .diploma_service
        .render(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let filename = format!("attachment; filename=\"kursbevis-{}.pdf\"", payload.course_id);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        pdf_bytes,
    )
        .into_response())
}
