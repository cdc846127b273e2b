// src/models/progress.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::locale_map::LocaleText;

// Progresso por usuário e curso: a lista de módulos concluídos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub completed_module_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

// Registro desnormalizado gravado quando todos os módulos passam.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseCompletion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub user_name: String,
    #[schema(value_type = Object)]
    pub course_title: Json<LocaleText>,
    pub completed_at: DateTime<Utc>,
}

/// Respostas do aluno: id da pergunta -> ids das alternativas escolhidas.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizPayload {
    pub answers: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub total_questions: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub score_percentage: u8,
    pub required_percentage: u8,
    pub passed: bool,
    pub incorrect_question_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseCompletionStatus {
    pub total_modules: usize,
    pub completed_modules: usize,
    pub completed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub result: QuizResult,
    pub course: CourseCompletionStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub completed_module_ids: Vec<Uuid>,
    pub course: CourseCompletionStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordCompletionPayload {
    pub course_id: Uuid,
}
