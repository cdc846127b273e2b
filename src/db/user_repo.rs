// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{auth::User, membership::CustomerUser},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

pub struct NewUser<'a> {
    pub company_id: Option<Uuid>,
    pub name: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub password_hash: &'a str,
}

fn unique_user_error(constraint: &str) -> AppError {
    if constraint.contains("phone") {
        AppError::PhoneAlreadyExists
    } else {
        AppError::EmailAlreadyExists
    }
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Login aceita e-mail ou telefone no mesmo campo.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(email) = lower($1) OR phone = $1 LIMIT 1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_contact<'e, E>(
        &self,
        executor: E,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NOT NULL AND lower(email) = lower($1))
               OR ($2::text IS NOT NULL AND phone = $2)
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (company_id, name, email, phone, password_hash, must_change_password)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING *
            "#,
        )
        .bind(new_user.company_id)
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.phone)
        .bind(new_user.password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, unique_user_error))
    }

    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, phone = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, unique_user_error))?
        .ok_or(AppError::UserNotFound)
    }

    pub async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
        must_change_password: bool,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, must_change_password = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(must_change_password)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn touch_login(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list_by_customer(&self, customer_id: Uuid) -> Result<Vec<CustomerUser>, AppError> {
        let users = sqlx::query_as::<_, CustomerUser>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, u.phone,
                   m.roles, m.assigned_course_ids, u.last_login_at
            FROM customer_memberships m
            JOIN users u ON u.id = m.user_id
            WHERE m.customer_id = $1
            ORDER BY u.name
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
