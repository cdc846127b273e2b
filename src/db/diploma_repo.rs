// src/db/diploma_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::diploma::{DiplomaTemplate, DiplomaTemplatePayload},
};

#[derive(Clone)]
pub struct DiplomaRepository {
    pool: PgPool,
}

impl DiplomaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &DiplomaTemplatePayload) -> Result<DiplomaTemplate, AppError> {
        let template = sqlx::query_as::<_, DiplomaTemplate>(
            r#"
            INSERT INTO diploma_templates (company_id, title, body, signature_name, issuer_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(input.company_id)
        .bind(&input.title)
        .bind(&input.body)
        .bind(&input.signature_name)
        .bind(&input.issuer_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DiplomaTemplate>, AppError> {
        let template = sqlx::query_as::<_, DiplomaTemplate>("SELECT * FROM diploma_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(template)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<DiplomaTemplate>, AppError> {
        let templates = sqlx::query_as::<_, DiplomaTemplate>(
            "SELECT * FROM diploma_templates WHERE company_id = $1 ORDER BY title",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    pub async fn update(&self, id: Uuid, input: &DiplomaTemplatePayload) -> Result<DiplomaTemplate, AppError> {
        sqlx::query_as::<_, DiplomaTemplate>(
            r#"
            UPDATE diploma_templates
            SET title = $2, body = $3, signature_name = $4, issuer_name = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.body)
        .bind(&input.signature_name)
        .bind(&input.issuer_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::TemplateNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM diploma_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::TemplateNotFound);
        }
        Ok(())
    }
}
