// src/db/company_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::company::{Company, CompanyPayload},
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &CompanyPayload) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, org_number, contact_email, contact_phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.org_number)
        .bind(&input.contact_email)
        .bind(&input.contact_phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::UniqueConstraintViolation("org_number".into())))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn list(&self) -> Result<Vec<Company>, AppError> {
        let companies = sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(companies)
    }

    pub async fn update(&self, id: Uuid, input: &CompanyPayload) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies
            SET name = $2, org_number = $3, contact_email = $4, contact_phone = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.org_number)
        .bind(&input.contact_email)
        .bind(&input.contact_phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::UniqueConstraintViolation("org_number".into())))?
        .ok_or(AppError::CompanyNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::CompanyNotFound);
        }
        Ok(())
    }
}
