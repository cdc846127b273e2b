// src/handlers/invites.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::{AuthedJson, AuthenticatedUser},
        i18n::Locale,
    },
    models::{
        invite::{CourseInvite, CreateInvitePayload, RedeemInvitePayload},
        membership::Membership,
    },
};

#[utoipa::path(
    post,
    path = "/api/internal/invites",
    tag = "Internal",
    request_body(content = CreateInvitePayload, description = "Mais o campo `idToken`"),
    responses(
        (status = 201, description = "Convite criado com código curto", body = CourseInvite),
        (status = 403, description = "Apenas admins do cliente")
    )
)]
pub async fn create_invite(
    State(app_state): State<AppState>,
    request: AuthedJson<CreateInvitePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let AuthedJson { user, locale, payload } = request;

    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let invite = app_state
        .invite_service
        .create_invite(&user, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(invite)))
}

#[utoipa::path(
    post,
    path = "/api/invites/redeem",
    tag = "Course Access",
    request_body = RedeemInvitePayload,
    responses(
        (status = 200, description = "Curso liberado para o usuário logado", body = Membership),
        (status = 400, description = "Convite inválido, expirado ou esgotado")
    ),
    security(("api_jwt" = []))
)]
pub async fn redeem_invite(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<RedeemInvitePayload>,
) -> Result<Json<Membership>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let membership = app_state
        .invite_service
        .redeem(&user, &payload.code)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(membership))
}
