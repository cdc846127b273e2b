// src/models/registry.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySearchPayload {
    #[validate(length(min = 2, max = 100, message = "invalid_input"))]
    #[schema(example = "Brannvern")]
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanySuggestion {
    #[schema(example = "987654321")]
    pub org_number: String,
    pub name: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}
