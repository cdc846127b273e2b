// src/models/course.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::common::locale_map::{LocaleList, LocaleText};

// --- ENUMS ---

// Mapeia o CREATE TYPE course_status do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "course_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
    Active,
    Inactive,
}

// Mapeia o CREATE TYPE module_type do banco
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "module_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Normal,
    Exam,
}

// ---
// Course
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub company_id: Uuid,
    #[schema(value_type = Object, example = json!({"no": "Brannvern", "en": "Fire safety"}))]
    pub title: Json<LocaleText>,
    #[schema(value_type = Object)]
    pub description: Json<LocaleText>,
    pub languages: Vec<String>,
    pub status: CourseStatus,
    pub diploma_template_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoursePayload {
    pub company_id: Uuid,
    #[schema(value_type = Object)]
    pub title: LocaleText,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub description: LocaleText,
    #[serde(default)]
    pub languages: Vec<String>,
    pub status: Option<CourseStatus>,
    pub diploma_template_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoursePayload {
    #[schema(value_type = Option<Object>)]
    pub title: Option<LocaleText>,
    #[schema(value_type = Option<Object>)]
    pub description: Option<LocaleText>,
    pub languages: Option<Vec<String>>,
    pub status: Option<CourseStatus>,
    pub diploma_template_id: Option<Uuid>,
}

// ---
// Perguntas do quiz (guardadas como JSONB dentro do módulo)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAlternative {
    pub id: String,
    #[schema(value_type = Object)]
    pub text: LocaleText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuestion {
    pub id: String,
    #[schema(value_type = Object)]
    pub title: LocaleText,
    pub alternatives: Vec<QuestionAlternative>,
    // Formato antigo: uma única resposta certa
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer_id: Option<String>,
    #[serde(default)]
    pub correct_answer_ids: Vec<String>,
}

// ---
// CourseModule (a sub-coleção courses/{id}/modules)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub id: Uuid,
    pub course_id: Uuid,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
    #[schema(value_type = Object)]
    pub title: Json<LocaleText>,
    #[schema(value_type = Object)]
    pub summary: Json<LocaleText>,
    #[schema(value_type = Object)]
    pub body: Json<LocaleText>,
    #[schema(value_type = Object)]
    pub video_urls: Json<LocaleList>,
    #[schema(value_type = Object)]
    pub image_urls: Json<LocaleList>,
    #[schema(value_type = Vec<CourseQuestion>)]
    pub questions: Json<Vec<CourseQuestion>>,
    pub module_type: ModuleType,
    pub exam_pass_percentage: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModulePayload {
    #[schema(value_type = Object)]
    pub title: LocaleText,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub summary: LocaleText,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub body: LocaleText,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub video_urls: LocaleList,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub image_urls: LocaleList,
    #[serde(default)]
    pub questions: Vec<CourseQuestion>,
    pub module_type: Option<ModuleType>,
    pub exam_pass_percentage: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderModulesPayload {
    /// Ordem completa desejada.
    #[serde(default)]
    pub module_ids: Vec<Uuid>,
    /// Ou um único arraste: o módulo vai para a posição `toIndex`.
    pub move_to: Option<ModuleMove>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMove {
    pub module_id: Uuid,
    pub to_index: usize,
}
