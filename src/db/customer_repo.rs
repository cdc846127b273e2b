// src/db/customer_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{Customer, CustomerPayload},
};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        input: &CustomerPayload,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (
                company_id, parent_customer_id, name, org_number, address, postal_code,
                city, contact_person, contact_phone, contact_email
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(company_id)
        .bind(input.parent_customer_id)
        .bind(&input.name)
        .bind(&input.org_number)
        .bind(&input.address)
        .bind(&input.postal_code)
        .bind(&input.city)
        .bind(&input.contact_person)
        .bind(&input.contact_phone)
        .bind(&input.contact_email)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE company_id = $1 ORDER BY name",
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ANY($1) ORDER BY name")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn list_children(&self, parent_id: Uuid) -> Result<Vec<Customer>, AppError> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE parent_customer_id = $1 ORDER BY name",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    /// IDs do próprio cliente e de todos os seus ancestrais (mais próximo primeiro).
    pub async fn ancestor_ids(&self, id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE chain AS (
                SELECT id, parent_customer_id, 0 AS depth FROM customers WHERE id = $1
                UNION ALL
                SELECT c.id, c.parent_customer_id, chain.depth + 1
                FROM customers c
                JOIN chain ON c.id = chain.parent_customer_id
                WHERE chain.depth < 16
            )
            SELECT id FROM chain ORDER BY depth
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn update(&self, id: Uuid, input: &CustomerPayload) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET parent_customer_id = $2, name = $3, org_number = $4, address = $5,
                postal_code = $6, city = $7, contact_person = $8, contact_phone = $9,
                contact_email = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.parent_customer_id)
        .bind(&input.name)
        .bind(&input.org_number)
        .bind(&input.address)
        .bind(&input.postal_code)
        .bind(&input.city)
        .bind(&input.contact_person)
        .bind(&input.contact_phone)
        .bind(&input.contact_email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CustomerNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::CustomerNotFound);
        }
        Ok(())
    }
}
