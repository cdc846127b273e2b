// src/handlers/courses.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::course::{
        Course, CourseModule, CoursePayload, ModulePayload, ReorderModulesPayload, UpdateCoursePayload,
    },
};

// ---
// Cursos
// ---

#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "Courses",
    request_body = CoursePayload,
    responses(
        (status = 201, description = "Curso criado", body = Course)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_course(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CoursePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let course = app_state
        .course_service
        .create_course(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    get,
    path = "/api/courses/assigned",
    tag = "Courses",
    responses(
        (status = 200, description = "Cursos ativos atribuídos ao usuário logado", body = Vec<Course>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_assigned_courses(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Course>>, ApiError> {
    let courses = app_state
        .course_service
        .list_assigned_courses(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    tag = "Courses",
    params(("id" = Uuid, Path, description = "ID do curso")),
    responses(
        (status = 200, description = "Curso", body = Course),
        (status = 404, description = "Curso não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_course(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
    let course = app_state
        .course_service
        .get_course(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(course))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    tag = "Courses",
    request_body = UpdateCoursePayload,
    params(("id" = Uuid, Path, description = "ID do curso")),
    responses(
        (status = 200, description = "Curso atualizado; idiomas novos propagados aos módulos", body = Course)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_course(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCoursePayload>,
) -> Result<Json<Course>, ApiError> {
    let course = app_state
        .course_service
        .update_course(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(course))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    tag = "Courses",
    params(("id" = Uuid, Path, description = "ID do curso")),
    responses(
        (status = 204, description = "Curso removido com módulos e progresso")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_course(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .course_service
        .delete_course(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Módulos
// ---

#[utoipa::path(
    get,
    path = "/api/courses/{id}/modules",
    tag = "Modules",
    params(("id" = Uuid, Path, description = "ID do curso")),
    responses(
        (status = 200, description = "Módulos em ordem", body = Vec<CourseModule>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_modules(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CourseModule>>, ApiError> {
    let modules = app_state
        .course_service
        .list_modules(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(modules))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/modules",
    tag = "Modules",
    request_body = ModulePayload,
    params(("id" = Uuid, Path, description = "ID do curso")),
    responses(
        (status = 201, description = "Módulo criado no fim da lista", body = CourseModule),
        (status = 400, description = "Pergunta inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_module(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModulePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let module = app_state
        .course_service
        .create_module(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(module)))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/modules/order",
    tag = "Modules",
    request_body = ReorderModulesPayload,
    params(("id" = Uuid, Path, description = "ID do curso")),
    responses(
        (status = 200, description = "Módulos na nova ordem", body = Vec<CourseModule>)
    ),
    security(("api_jwt" = []))
)]
pub async fn reorder_modules(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReorderModulesPayload>,
) -> Result<Json<Vec<CourseModule>>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let modules = app_state
        .course_service
        .reorder_modules(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(modules))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}/modules/{module_id}",
    tag = "Modules",
    params(
        ("id" = Uuid, Path, description = "ID do curso"),
        ("module_id" = Uuid, Path, description = "ID do módulo")
    ),
    responses(
        (status = 200, description = "Módulo", body = CourseModule),
        (status = 404, description = "Módulo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_module(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CourseModule>, ApiError> {
    let module = app_state
        .course_service
        .get_module(&user, id, module_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(module))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/modules/{module_id}",
    tag = "Modules",
    request_body = ModulePayload,
    params(
        ("id" = Uuid, Path, description = "ID do curso"),
        ("module_id" = Uuid, Path, description = "ID do módulo")
    ),
    responses(
        (status = 200, description = "Módulo atualizado", body = CourseModule)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_module(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ModulePayload>,
) -> Result<Json<CourseModule>, ApiError> {
    let module = app_state
        .course_service
        .update_module(&user, id, module_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(module))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}/modules/{module_id}",
    tag = "Modules",
    params(
        ("id" = Uuid, Path, description = "ID do curso"),
        ("module_id" = Uuid, Path, description = "ID do módulo")
    ),
    responses(
        (status = 204, description = "Módulo removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_module(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((id, module_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .course_service
        .delete_module(&user, id, module_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
