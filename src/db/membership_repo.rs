// src/db/membership_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::membership::Membership};

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find<'e, E>(&self, executor: E, user_id: Uuid, customer_id: Uuid) -> Result<Option<Membership>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            "SELECT * FROM customer_memberships WHERE user_id = $1 AND customer_id = $2",
        )
        .bind(user_id)
        .bind(customer_id)
        .fetch_optional(executor)
        .await?;
        Ok(membership)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Membership>, AppError> {
        let memberships = sqlx::query_as::<_, Membership>(
            "SELECT * FROM customer_memberships WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    pub async fn list_for_users(
        &self,
        customer_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Membership>, AppError> {
        let memberships = sqlx::query_as::<_, Membership>(
            "SELECT * FROM customer_memberships WHERE customer_id = $1 AND user_id = ANY($2)",
        )
        .bind(customer_id)
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(memberships)
    }

    /// Grava papéis e cursos. Última escrita vence, como no resto da aplicação.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        customer_id: Uuid,
        roles: &[String],
        assigned_course_ids: &[Uuid],
    ) -> Result<Membership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO customer_memberships (user_id, customer_id, roles, assigned_course_ids)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, customer_id)
            DO UPDATE SET
                roles = EXCLUDED.roles,
                assigned_course_ids = EXCLUDED.assigned_course_ids,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(customer_id)
        .bind(roles)
        .bind(assigned_course_ids)
        .fetch_one(executor)
        .await?;
        Ok(membership)
    }

    pub async fn delete<'e, E>(&self, executor: E, user_id: Uuid, customer_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customer_memberships WHERE user_id = $1 AND customer_id = $2")
            .bind(user_id)
            .bind(customer_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_user<'e, E>(&self, executor: E, user_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_memberships WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
