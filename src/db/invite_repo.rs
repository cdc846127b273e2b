// src/db/invite_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::invite::{CourseInvite, MagicLink},
};

// Cobre as coleções courseInvites e magicLinks
#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_invite(
        &self,
        code: &str,
        customer_id: Uuid,
        course_id: Uuid,
        created_by: Uuid,
        max_uses: Option<i32>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CourseInvite, AppError> {
        sqlx::query_as::<_, CourseInvite>(
            r#"
            INSERT INTO course_invites (code, customer_id, course_id, created_by, max_uses, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(customer_id)
        .bind(course_id)
        .bind(created_by)
        .bind(max_uses)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| AppError::UniqueConstraintViolation("code".into())))
    }

    pub async fn find_invite<'e, E>(&self, executor: E, code: &str) -> Result<Option<CourseInvite>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let invite = sqlx::query_as::<_, CourseInvite>(
            "SELECT * FROM course_invites WHERE code = $1 FOR UPDATE",
        )
        .bind(code)
        .fetch_optional(executor)
        .await?;
        Ok(invite)
    }

    pub async fn increment_use<'e, E>(&self, executor: E, invite_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE course_invites SET use_count = use_count + 1 WHERE id = $1")
            .bind(invite_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn create_magic_link(
        &self,
        code: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<MagicLink, AppError> {
        let link = sqlx::query_as::<_, MagicLink>(
            "INSERT INTO magic_links (code, user_id, expires_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(code)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(link)
    }

    /// Marca o código como usado e devolve-o, numa única instrução.
    /// `None` quando não existe, já foi usado ou expirou.
    pub async fn consume_magic_link(&self, code: &str) -> Result<Option<MagicLink>, AppError> {
        let link = sqlx::query_as::<_, MagicLink>(
            r#"
            UPDATE magic_links
            SET used_at = NOW()
            WHERE code = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING *
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(link)
    }
}
