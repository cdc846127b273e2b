// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Company (o "inquilino" criado pelo dono do sistema)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "Brannvern AS")]
    pub name: String,
    #[schema(example = "987654321")]
    pub org_number: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(length(equal = 9, message = "invalid_input"))]
    pub org_number: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}
