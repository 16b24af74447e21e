use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::auth::{Role, UserId};

/// A user row including the password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<UserCredentials> for User {
    fn from(user: UserCredentials) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Admin listing row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub enrolled_courses: i64,
}

impl User {
    /// Case-insensitive lookup used by signin
    pub async fn credentials_by_email(pool: &PgPool, email: &str) -> Result<Option<UserCredentials>, sqlx::Error> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, name, email, password_hash, role, created_at FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find(pool: &PgPool, id: UserId) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, name, email, role, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create(
        pool: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, role, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn list_with_enrollments(pool: &PgPool) -> Result<Vec<UserSummary>, sqlx::Error> {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.avatar_url, u.created_at,
                   COUNT(uc.course_id) AS enrolled_courses
            FROM users u
            LEFT JOIN user_courses uc ON u.id = uc.user_id
            GROUP BY u.id, u.name, u.email, u.role, u.avatar_url, u.created_at
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Returns false when no account has that email
    pub async fn set_role(pool: &PgPool, email: &str, role: Role) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET role = $2, updated_at = CURRENT_TIMESTAMP WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .bind(role.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
