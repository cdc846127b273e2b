// src/db/progress_repo.rs

use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, locale_map::LocaleText},
    models::progress::{CourseCompletion, CourseProgress},
};

#[derive(Clone)]
pub struct ProgressRepository {
    pool: PgPool,
}

impl ProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<CourseProgress>, AppError> {
        let progress = sqlx::query_as::<_, CourseProgress>(
            "SELECT * FROM course_progress WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(progress)
    }

    /// Acrescenta o módulo à lista de concluídos sem duplicar.
    pub async fn add_completed_module(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        module_id: Uuid,
    ) -> Result<CourseProgress, AppError> {
        let progress = sqlx::query_as::<_, CourseProgress>(
            r#"
            INSERT INTO course_progress (user_id, course_id, completed_module_ids)
            VALUES ($1, $2, ARRAY[$3]::uuid[])
            ON CONFLICT (user_id, course_id)
            DO UPDATE SET
                completed_module_ids = CASE
                    WHEN $3 = ANY(course_progress.completed_module_ids)
                        THEN course_progress.completed_module_ids
                    ELSE array_append(course_progress.completed_module_ids, $3)
                END,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(module_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(progress)
    }

    /// Idempotente: gravar duas vezes mantém a data da primeira conclusão.
    pub async fn upsert_completion(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        user_name: &str,
        course_title: &LocaleText,
    ) -> Result<CourseCompletion, AppError> {
        let completion = sqlx::query_as::<_, CourseCompletion>(
            r#"
            INSERT INTO course_completions (user_id, course_id, user_name, course_title)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, course_id)
            DO UPDATE SET user_name = EXCLUDED.user_name, course_title = EXCLUDED.course_title
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(user_name)
        .bind(Json(course_title))
        .fetch_one(&self.pool)
        .await?;
        Ok(completion)
    }

    pub async fn find_completion(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<CourseCompletion>, AppError> {
        let completion = sqlx::query_as::<_, CourseCompletion>(
            "SELECT * FROM course_completions WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(completion)
    }

    pub async fn list_completions_for_user(&self, user_id: Uuid) -> Result<Vec<CourseCompletion>, AppError> {
        let completions = sqlx::query_as::<_, CourseCompletion>(
            "SELECT * FROM course_completions WHERE user_id = $1 ORDER BY completed_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(completions)
    }
}
