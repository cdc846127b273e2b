// src/db/module_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        locale_map::{LocaleList, LocaleText},
    },
    models::course::{CourseModule, CourseQuestion, ModuleType},
};

#[derive(Clone)]
pub struct ModuleRepository {
    pool: PgPool,
}

/// Conteúdo gravável de um módulo (já normalizado pelo serviço).
pub struct ModuleRecord<'a> {
    pub title: &'a LocaleText,
    pub summary: &'a LocaleText,
    pub body: &'a LocaleText,
    pub video_urls: &'a LocaleList,
    pub image_urls: &'a LocaleList,
    pub questions: &'a [CourseQuestion],
    pub module_type: ModuleType,
    pub exam_pass_percentage: Option<i32>,
}

impl ModuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Novo módulo vai sempre para o fim da lista.
    pub async fn create(&self, course_id: Uuid, record: ModuleRecord<'_>) -> Result<CourseModule, AppError> {
        let module = sqlx::query_as::<_, CourseModule>(
            r#"
            INSERT INTO course_modules (
                course_id, sort_order, title, summary, body, video_urls, image_urls,
                questions, module_type, exam_pass_percentage
            )
            VALUES (
                $1,
                (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM course_modules WHERE course_id = $1),
                $2, $3, $4, $5, $6, $7, $8, $9
            )
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(Json(record.title))
        .bind(Json(record.summary))
        .bind(Json(record.body))
        .bind(Json(record.video_urls))
        .bind(Json(record.image_urls))
        .bind(Json(record.questions))
        .bind(record.module_type)
        .bind(record.exam_pass_percentage)
        .fetch_one(&self.pool)
        .await?;
        Ok(module)
    }

    pub async fn find(&self, course_id: Uuid, module_id: Uuid) -> Result<Option<CourseModule>, AppError> {
        let module = sqlx::query_as::<_, CourseModule>(
            "SELECT * FROM course_modules WHERE course_id = $1 AND id = $2",
        )
        .bind(course_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(module)
    }

    pub async fn list_by_course<'e, E>(&self, executor: E, course_id: Uuid) -> Result<Vec<CourseModule>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let modules = sqlx::query_as::<_, CourseModule>(
            "SELECT * FROM course_modules WHERE course_id = $1 ORDER BY sort_order, created_at",
        )
        .bind(course_id)
        .fetch_all(executor)
        .await?;
        Ok(modules)
    }

    pub async fn list_ids(&self, course_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM course_modules WHERE course_id = $1 ORDER BY sort_order, created_at",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        course_id: Uuid,
        module_id: Uuid,
        record: ModuleRecord<'_>,
    ) -> Result<CourseModule, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CourseModule>(
            r#"
            UPDATE course_modules
            SET title = $3, summary = $4, body = $5, video_urls = $6, image_urls = $7,
                questions = $8, module_type = $9, exam_pass_percentage = $10, updated_at = NOW()
            WHERE course_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(module_id)
        .bind(Json(record.title))
        .bind(Json(record.summary))
        .bind(Json(record.body))
        .bind(Json(record.video_urls))
        .bind(Json(record.image_urls))
        .bind(Json(record.questions))
        .bind(record.module_type)
        .bind(record.exam_pass_percentage)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ModuleNotFound)
    }

    pub async fn set_order<'e, E>(&self, executor: E, course_id: Uuid, module_id: Uuid, order: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE course_modules SET sort_order = $3, updated_at = NOW() WHERE course_id = $1 AND id = $2")
            .bind(course_id)
            .bind(module_id)
            .bind(order)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, course_id: Uuid, module_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM course_modules WHERE course_id = $1 AND id = $2")
            .bind(course_id)
            .bind(module_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::ModuleNotFound);
        }
        Ok(())
    }
}
