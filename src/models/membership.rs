// src/models/membership.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Papéis por cliente. No banco ficam como TEXT[] ("admin", "user").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    User,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::User => "user",
        }
    }
}

// ---
// Membership: o registro por-cliente de papéis e cursos atribuídos.
// O acesso a um curso é decidido por `assigned_course_ids`, não por uma ACL.
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = json!(["admin", "user"]))]
    pub roles: Vec<String>,
    pub assigned_course_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn has_role(&self, role: MemberRole) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn is_assigned(&self, course_id: Uuid) -> bool {
        self.assigned_course_ids.contains(&course_id)
    }
}

/// Usuário + o seu registro no cliente, para as tabelas de administração.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub roles: Vec<String>,
    pub assigned_course_ids: Vec<Uuid>,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessChange {
    Grant,
    Revoke,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseAccessPayload {
    pub course_id: Uuid,
    pub change: AccessChange,
    #[serde(default = "default_notify")]
    pub notify: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCourseAccessPayload {
    pub course_id: Uuid,
    pub change: AccessChange,
    #[validate(length(min = 1, message = "required"))]
    pub user_ids: Vec<Uuid>,
    #[serde(default = "default_notify")]
    pub notify: bool,
}

fn default_notify() -> bool {
    true
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAccessOutcome {
    pub changed: Vec<Uuid>,
    pub skipped: Vec<Uuid>,
}

// ---
// Provisionamento de usuários (rotas internas, token no corpo)
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default = "default_roles")]
    pub roles: Vec<MemberRole>,
    #[serde(default)]
    pub course_ids: Vec<Uuid>,
}

fn default_roles() -> Vec<MemberRole> {
    vec![MemberRole::User]
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    pub customer_id: Uuid,
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub roles: Option<Vec<MemberRole>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserPayload {
    pub customer_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedUser {
    pub user_id: Uuid,
    // false quando um usuário existente (mesmo e-mail/telefone) foi ligado ao cliente
    pub created: bool,
    pub membership: Membership,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    pub membership_removed: bool,
    pub user_deleted: bool,
}
