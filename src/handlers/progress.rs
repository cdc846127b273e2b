// src/handlers/progress.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::{AuthedJson, AuthenticatedUser},
        i18n::Locale,
    },
    models::progress::{
        CourseCompletion, ProgressResponse, RecordCompletionPayload, SubmitQuizPayload, SubmitQuizResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/courses/{id}/progress",
    tag = "Progress",
    params(("id" = Uuid, Path, description = "ID do curso")),
    responses(
        (status = 200, description = "Módulos concluídos e estado do curso", body = ProgressResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = app_state
        .progress_service
        .get_progress(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/modules/{module_id}/complete",
    tag = "Progress",
    params(
        ("id" = Uuid, Path, description = "ID do curso"),
        ("module_id" = Uuid, Path, description = "ID do módulo sem perguntas")
    ),
    responses(
        (status = 200, description = "Módulo marcado como concluído", body = ProgressResponse),
        (status = 400, description = "Módulo tem quiz; use a rota de respostas")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_module(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = app_state
        .progress_service
        .complete_module(&user, id, module_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(progress))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/modules/{module_id}/quiz",
    tag = "Progress",
    request_body = SubmitQuizPayload,
    params(
        ("id" = Uuid, Path, description = "ID do curso"),
        ("module_id" = Uuid, Path, description = "ID do módulo")
    ),
    responses(
        (status = 200, description = "Resultado do quiz e estado do curso", body = SubmitQuizResponse)
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_quiz(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SubmitQuizPayload>,
) -> Result<Json<SubmitQuizResponse>, ApiError> {
    let response = app_state
        .progress_service
        .submit_quiz(&user, id, module_id, &payload.answers)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/me/completions",
    tag = "Progress",
    responses(
        (status = 200, description = "Cursos concluídos pelo usuário logado", body = Vec<CourseCompletion>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_completions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<CourseCompletion>>, ApiError> {
    let completions = app_state
        .progress_service
        .list_my_completions(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(completions))
}

// Rota interna: token no corpo
#[utoipa::path(
    post,
    path = "/api/internal/completions",
    tag = "Internal",
    request_body(content = RecordCompletionPayload, description = "Mais o campo `idToken`"),
    responses(
        (status = 201, description = "Conclusão registrada", body = CourseCompletion),
        (status = 409, description = "Ainda há módulos pendentes")
    )
)]
pub async fn record_completion(
    State(app_state): State<AppState>,
    request: AuthedJson<RecordCompletionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let AuthedJson { user, locale, payload } = request;

    let completion = app_state
        .progress_service
        .record_completion(&user, payload.course_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(completion)))
}
