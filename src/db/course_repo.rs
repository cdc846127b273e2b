// src/db/course_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, locale_map::LocaleText},
    models::course::{Course, CourseStatus},
};

#[derive(Clone)]
pub struct CourseRepository {
    pool: PgPool,
}

/// Campos graváveis de um curso, já normalizados pelo serviço.
pub struct CourseRecord<'a> {
    pub title: &'a LocaleText,
    pub description: &'a LocaleText,
    pub languages: &'a [String],
    pub status: CourseStatus,
    pub diploma_template_id: Option<Uuid>,
}

impl CourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        company_id: Uuid,
        created_by: Uuid,
        record: CourseRecord<'_>,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (company_id, title, description, languages, status, diploma_template_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(Json(record.title))
        .bind(Json(record.description))
        .bind(record.languages)
        .bind(record.status)
        .bind(record.diploma_template_id)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(course)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE company_id = $1 ORDER BY created_at DESC",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    pub async fn list_active_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE id = ANY($1) AND status = 'active' ORDER BY created_at DESC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, record: CourseRecord<'_>) -> Result<Course, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = $2, description = $3, languages = $4, status = $5,
                diploma_template_id = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(record.title))
        .bind(Json(record.description))
        .bind(record.languages)
        .bind(record.status)
        .bind(record.diploma_template_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::CourseNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::CourseNotFound);
        }
        Ok(())
    }
}
