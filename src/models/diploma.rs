// src/models/diploma.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiplomaTemplate {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(example = "Kursbevis")]
    pub title: String,
    // Aceita {name}, {course} e {date}
    #[schema(example = "{name} har fullført kurset {course} den {date}.")]
    pub body: String,
    pub signature_name: Option<String>,
    pub issuer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiplomaTemplatePayload {
    pub company_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub title: String,
    #[validate(length(min = 1, message = "required"))]
    pub body: String,
    pub signature_name: Option<String>,
    pub issuer_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiplomaRequest {
    pub course_id: Uuid,
    // Admins podem gerar o diploma de outro usuário
    pub user_id: Option<Uuid>,
    pub lang: Option<String>,
}
