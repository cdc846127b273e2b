// src/handlers/customers.rs

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
    models::{
        customer::{Customer, CustomerPayload},
        membership::{BulkAccessOutcome, BulkCourseAccessPayload, CourseAccessPayload, CustomerUser, Membership},
    },
};

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    let customer = app_state
        .tenancy_service
        .get_customer(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    request_body = CustomerPayload,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 400, description = "Cliente pai inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .tenancy_service
        .update_customer(&user, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente removido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .tenancy_service
        .delete_customer(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/sub-units",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente pai")),
    responses(
        (status = 200, description = "Sub-unidades diretas", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sub_units(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let children = app_state
        .tenancy_service
        .list_sub_units(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(children))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/users",
    tag = "Customers",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Usuários do cliente com papéis e cursos", body = Vec<CustomerUser>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CustomerUser>>, ApiError> {
    let users = app_state
        .user_service
        .list_customer_users(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/customers/{id}/users/{user_id}/course-access",
    tag = "Course Access",
    request_body = CourseAccessPayload,
    params(
        ("id" = Uuid, Path, description = "ID do cliente"),
        ("user_id" = Uuid, Path, description = "ID do usuário")
    ),
    responses(
        (status = 200, description = "Registro do usuário após a mudança", body = Membership)
    ),
    security(("api_jwt" = []))
)]
pub async fn set_course_access(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path((customer_id, user_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CourseAccessPayload>,
) -> Result<Json<Membership>, ApiError> {
    let membership = app_state
        .access_service
        .set_course_access(&user, customer_id, user_id, payload.course_id, payload.change, payload.notify)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(membership))
}

#[utoipa::path(
    post,
    path = "/api/customers/{id}/course-access/bulk",
    tag = "Course Access",
    request_body = BulkCourseAccessPayload,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Usuários alterados e pulados", body = BulkAccessOutcome)
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_course_access(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<BulkCourseAccessPayload>,
) -> Result<Json<BulkAccessOutcome>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .access_service
        .bulk_set_course_access(
            &user,
            customer_id,
            &payload.user_ids,
            payload.course_id,
            payload.change,
            payload.notify,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(outcome))
}
