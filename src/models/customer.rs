// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Customer (cliente de uma empresa; sub-unidades via parent_customer_id)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub parent_customer_id: Option<Uuid>,
    #[schema(example = "Kommune Vest - Avdeling Nord")]
    pub name: String,
    pub org_number: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    pub parent_customer_id: Option<Uuid>,
    #[validate(length(equal = 9, message = "invalid_input"))]
    pub org_number: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub contact_email: Option<String>,
}

/// Dados do primeiro administrador criado junto com o cliente.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAdminPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(nested)]
    #[serde(flatten)]
    pub customer: CustomerPayload,
    #[validate(nested)]
    pub admin: Option<CustomerAdminPayload>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerResponse {
    pub customer: Customer,
    pub admin_user_id: Option<Uuid>,
}
